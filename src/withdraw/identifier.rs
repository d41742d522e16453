//! Withdrawal identifier derivation
//!
//! Source records differ in which field carries a chain-recognizable
//! identifier, so the lookup key handed to the SDK falls back through a
//! fixed priority chain. The SDK treats the value as an opaque key; nothing
//! here verifies chain authenticity.

use crate::types::CanonicalDepositRecord;

/// First match wins: a plausible transaction hash, then the third segment of
/// the note, then the first secret.
pub fn derive_withdrawal_identifier(record: &CanonicalDepositRecord) -> String {
    if record.tx_hash.starts_with("0x") && record.tx_hash.len() > 10 {
        return record.tx_hash.clone();
    }

    if let Some(note) = &record.privacy.note {
        let segments: Vec<&str> = note.split('-').collect();
        if segments.len() >= 3 {
            return format!("0x{}", segments[2]);
        }
    }

    format!(
        "0x{}",
        record.privacy.secrets.first().map(String::as_str).unwrap_or_default()
    )
}
