//! Validity filter
//!
//! Pure, order-preserving pass over the normalized record list. A record
//! reaches the durable canonical set only if it is still pending AND carries
//! non-empty secrets, nullifiers and pools. Rejections are logged with the
//! specific failing predicate; logging is the only side effect.

use crate::types::{CanonicalDepositRecord, DepositStatus, RejectionReason};

/// Keeps the records that satisfy the acceptance invariant, in input order.
pub fn filter_eligible(records: Vec<CanonicalDepositRecord>) -> Vec<CanonicalDepositRecord> {
    records
        .into_iter()
        .filter(|record| match eligibility(record) {
            Ok(()) => true,
            Err(reason) => {
                log::info!("filtered out {}: {}", record.deposit_id, reason);
                false
            }
        })
        .collect()
}

/// The acceptance invariant for the durable canonical set.
pub fn eligibility(record: &CanonicalDepositRecord) -> Result<(), RejectionReason> {
    if record.status != DepositStatus::Pending {
        return Err(RejectionReason::NotPending(record.status));
    }
    let material = [
        ("secrets", &record.privacy.secrets),
        ("nullifiers", &record.privacy.nullifiers),
        ("pools", &record.privacy.pools),
    ];
    for (field, list) in material {
        if list.is_empty() {
            return Err(RejectionReason::EmptyPrivacyField(field));
        }
    }
    Ok(())
}
