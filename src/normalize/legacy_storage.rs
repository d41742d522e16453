//! Legacy localStorage dump parser
//!
//! One mapping, two coexisting value shapes:
//! - arrays keyed by wallet address, whose elements carry a `typhoonData`
//!   object holding swap parameters (fromToken/toToken/amount/slippage/
//!   recipientAddress) instead of privacy arrays;
//! - flat objects keyed by an arbitrary id, with secrets/nullifiers/pools at
//!   the top level next to `transactionHash`, `walletAddress` and
//!   `pendingUserDeposit`.
//!
//! The acceptance gates intentionally differ from the backup formats and
//! from each other; existing exported data relies on both quirks, so they
//! are preserved rather than unified (see DESIGN.md).

use crate::normalize::{decimal_string, epoch_millis, json_string, parse_status, string_list};
use crate::types::{
    CanonicalDepositRecord, DepositStatus, PrivacyMaterial, RejectionReason, SwapParams,
};
use serde_json::Value;

pub fn parse_file(root: &Value, source: &str) -> (Vec<CanonicalDepositRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    let Some(entries) = root.as_object() else {
        log::warn!("{}: top level is not an object", source);
        return (records, skipped);
    };

    for (key, value) in entries {
        match value {
            Value::Array(list) => {
                for entry in list {
                    match parse_swap_entry(key, entry, source) {
                        Ok(record) => records.push(record),
                        Err(reason) => {
                            skipped += 1;
                            log::warn!("{}: skipping swap entry for {}: {}", source, key, reason);
                        }
                    }
                }
            }
            Value::Object(_) => match parse_flat_entry(key, value, source) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    log::warn!("{}: skipping entry {}: {}", source, key, reason);
                }
            },
            _ => {
                skipped += 1;
                log::warn!("{}: entry {} is neither array nor object", source, key);
            }
        }
    }

    (records, skipped)
}

/// Wallet-keyed array element: `typhoonData` holds swap parameters, not
/// privacy arrays. The whole inner object maps into `swap_params` and the
/// privacy arrays stay empty, which keeps these records out of the eligible
/// set downstream.
fn parse_swap_entry(
    wallet: &str,
    entry: &Value,
    source: &str,
) -> Result<CanonicalDepositRecord, RejectionReason> {
    let obj = entry.as_object().ok_or(RejectionReason::NotAnObject)?;
    let typhoon = typhoon_data_object(obj)?;

    let timestamp = epoch_millis(obj.get("timestamp"));
    let deposit_id = match obj.get("depositId").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => format!("deposit_{}_{}", wallet, timestamp),
    };

    Ok(CanonicalDepositRecord {
        deposit_id,
        tx_hash: json_string(obj.get("txHash")),
        wallet_address: wallet.to_string(),
        token_address: json_string(obj.get("tokenAddress")),
        amount: decimal_string(obj.get("amount")),
        timestamp,
        status: parse_status(obj.get("status")),
        privacy: PrivacyMaterial {
            swap_params: SwapParams::from_value(typhoon),
            ..PrivacyMaterial::default()
        },
        source: source.to_string(),
    })
}

/// Flat id-keyed object: privacy arrays live at the top level. The gate
/// only requires the fields to be PRESENT; empty arrays are accepted here,
/// unlike the backup formats.
fn parse_flat_entry(
    key: &str,
    entry: &Value,
    source: &str,
) -> Result<CanonicalDepositRecord, RejectionReason> {
    let obj = entry.as_object().ok_or(RejectionReason::NotAnObject)?;
    privacy_fields_present(obj)?;

    let timestamp = epoch_millis(obj.get("timestamp"));
    // Keys that already follow the deposit_{...}_{...} convention are used
    // verbatim; bare keys get the synthesized form.
    let deposit_id = if key.contains('_') {
        key.to_string()
    } else {
        format!("deposit_{}_{}", key, timestamp)
    };

    let status = if obj.get("pendingUserDeposit").and_then(Value::as_bool) == Some(true) {
        DepositStatus::Pending
    } else {
        DepositStatus::Available
    };

    Ok(CanonicalDepositRecord {
        deposit_id,
        tx_hash: json_string(obj.get("transactionHash")),
        wallet_address: json_string(obj.get("walletAddress")),
        token_address: json_string(obj.get("tokenAddress")),
        amount: decimal_string(obj.get("amount")),
        timestamp,
        status,
        privacy: PrivacyMaterial {
            secrets: string_list(obj.get("secrets")),
            nullifiers: string_list(obj.get("nullifiers")),
            pools: string_list(obj.get("pools")),
            note: obj.get("note").and_then(Value::as_str).map(str::to_string),
            swap_params: obj.get("swapParams").and_then(SwapParams::from_value),
        },
        source: source.to_string(),
    })
}

/// Swap-entry gate: any non-null object passes, regardless of its fields.
fn typhoon_data_object(obj: &serde_json::Map<String, Value>) -> Result<&Value, RejectionReason> {
    obj.get("typhoonData")
        .filter(|v| v.is_object())
        .ok_or(RejectionReason::MissingTyphoonData)
}

/// Flat-entry gate: presence only, emptiness allowed.
fn privacy_fields_present(obj: &serde_json::Map<String, Value>) -> Result<(), RejectionReason> {
    for field in ["secrets", "nullifiers", "pools"] {
        if !obj.contains_key(field) {
            return Err(RejectionReason::MissingPrivacyField(field));
        }
    }
    Ok(())
}
