//! Swap-backup export parser
//!
//! Structurally the same wallet-keyed layout as the deposit backup, with two
//! quirks: `amount` may arrive as a JSON number (coerced to its decimal
//! string form without changing the magnitude) and there is no note field.

use crate::normalize::{decimal_string, epoch_millis, json_string, parse_status, string_list};
use crate::types::{CanonicalDepositRecord, PrivacyMaterial, RejectionReason, SwapParams};
use serde_json::Value;

pub fn parse_file(root: &Value, source: &str) -> (Vec<CanonicalDepositRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0;

    let Some(wallets) = root.as_object() else {
        log::warn!("{}: top level is not a wallet map", source);
        return (records, skipped);
    };

    for (wallet, entries) in wallets {
        let Some(list) = entries.as_array() else {
            log::warn!("{}: entry for {} is not an array, skipping", source, wallet);
            skipped += 1;
            continue;
        };
        for entry in list {
            match parse_entry(wallet, entry, source) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    skipped += 1;
                    log::warn!("{}: skipping swap deposit for {}: {}", source, wallet, reason);
                }
            }
        }
    }

    (records, skipped)
}

fn parse_entry(
    wallet: &str,
    entry: &Value,
    source: &str,
) -> Result<CanonicalDepositRecord, RejectionReason> {
    let obj = entry.as_object().ok_or(RejectionReason::NotAnObject)?;
    let typhoon = obj
        .get("typhoonData")
        .filter(|v| v.is_object())
        .ok_or(RejectionReason::MissingTyphoonData)?;
    complete_swap_typhoon_data(typhoon)?;

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
            secrets: string_list(typhoon.get("secrets")),
            nullifiers: string_list(typhoon.get("nullifiers")),
            pools: string_list(typhoon.get("pools")),
            note: None,
            swap_params: typhoon.get("swapParams").and_then(SwapParams::from_value),
        },
        source: source.to_string(),
    })
}

/// Swap-backup acceptance gate: same non-emptiness requirement as the
/// deposit backup, kept as its own predicate so the two formats can diverge
/// without touching each other.
fn complete_swap_typhoon_data(typhoon: &Value) -> Result<(), RejectionReason> {
    for field in ["secrets", "nullifiers", "pools"] {
        match typhoon.get(field).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => {}
            _ => return Err(RejectionReason::EmptyPrivacyField(field)),
        }
    }
    Ok(())
}
