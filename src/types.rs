//! Shared pipeline types
//!
//! The canonical deposit record is the unit of work for both pipeline runs:
//! the normalize run produces them, the withdrawal run consumes them. Records
//! are immutable once written to the unified store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a deposit. Only `Pending` deposits are eligible
/// for batch withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Available,
    Withdrawn,
}

impl fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DepositStatus::Pending => "pending",
            DepositStatus::Available => "available",
            DepositStatus::Withdrawn => "withdrawn",
        };
        write!(f, "{}", s)
    }
}

/// Parameters of the swap that produced a deposit, when the source export
/// recorded them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    #[serde(default)]
    pub from_token: String,
    #[serde(default)]
    pub to_token: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub slippage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_address: Option<String>,
}

impl SwapParams {
    /// Lenient mapping from an exported swap-parameter object; missing
    /// fields default, anything that is not an object yields `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |field: &str| -> String {
            obj.get(field)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let amount = match obj.get("amount") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Some(SwapParams {
            from_token: text("fromToken"),
            to_token: text("toToken"),
            amount,
            slippage: obj
                .get("slippage")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or_default(),
            recipient_address: obj
                .get("recipientAddress")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Cryptographic material the Typhoon SDK needs to prove ownership of a
/// deposit. The pipeline never inspects the content beyond non-emptiness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyMaterial {
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub nullifiers: Vec<String>,
    #[serde(default)]
    pub pools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_params: Option<SwapParams>,
}

/// Unified, post-normalization representation of a deposit, independent of
/// which source export it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDepositRecord {
    /// Unique within a run; synthesized from the source key and timestamp
    /// when the export has no id of its own.
    pub deposit_id: String,
    /// On-chain transaction hash when the export knows it; may be empty.
    pub tx_hash: String,
    pub wallet_address: String,
    pub token_address: String,
    /// Decimal string; numeric source values are coerced without altering
    /// the underlying magnitude.
    pub amount: String,
    /// Epoch milliseconds.
    pub timestamp: u64,
    pub status: DepositStatus,
    #[serde(rename = "privacyMaterial")]
    pub privacy: PrivacyMaterial,
    /// Provenance tag (source file name), kept for audit.
    pub source: String,
}

/// Outcome of one withdrawal attempt. Append-only within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResult {
    pub deposit_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    pub timestamp: u64,
}

/// Why a source record was kept out of the canonical set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectionReason {
    #[error("entry is not a JSON object")]
    NotAnObject,

    #[error("typhoonData is missing or not an object")]
    MissingTyphoonData,

    #[error("privacy material field `{0}` is empty or missing")]
    EmptyPrivacyField(&'static str),

    #[error("privacy material field `{0}` is missing")]
    MissingPrivacyField(&'static str),

    #[error("status is `{0}`, only pending deposits are eligible")]
    NotPending(DepositStatus),
}

/// Current wall clock in epoch milliseconds.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
