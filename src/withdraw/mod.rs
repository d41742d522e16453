//! Batch withdrawal driver
//!
//! Consumes the unified canonical set and drives one withdrawal per record
//! through the SDK, strictly sequentially and in canonical-set order. Per
//! record: derive identifier, initialize the SDK with the record's privacy
//! material, request calldata, execute. Any SDK error or timeout becomes a
//! failed result; the batch never aborts on a record failure.

pub mod identifier;
pub mod report;

pub use identifier::derive_withdrawal_identifier;

use crate::sdk::{PrivacySdk, SdkError};
use crate::store::UnifiedStore;
use crate::types::{now_millis, CanonicalDepositRecord, WithdrawalResult};
use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;

/// Pacing and timeout policy for a batch run.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Delay between records (not before the first or after the last),
    /// to stay under upstream rate limits.
    pub record_delay: Duration,
    /// Upper bound on each individual SDK call; a hang becomes a failed
    /// result instead of stalling the batch.
    pub call_timeout: Duration,
    /// Recipient used when a record carries none of its own.
    pub default_recipient: Option<String>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            record_delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(60),
            default_recipient: None,
        }
    }
}

/// Runs the whole batch. Always returns one result per input record, in
/// input order.
pub async fn run_batch<S: PrivacySdk>(
    sdk: &mut S,
    deposits: &[CanonicalDepositRecord],
    settings: &DriverSettings,
) -> Vec<WithdrawalResult> {
    let total = deposits.len();
    let mut results = Vec::with_capacity(total);

    for (index, record) in deposits.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(settings.record_delay).await;
        }
        println!("[{}/{}] withdrawing {}", index + 1, total, record.deposit_id);

        let result = withdraw_one(sdk, record, settings).await;
        match &result.error {
            None => println!(
                "[{}/{}] {} ok{}",
                index + 1,
                total,
                record.deposit_id,
                result
                    .transaction_hash
                    .as_deref()
                    .map(|tx| format!(" ({})", tx))
                    .unwrap_or_default()
            ),
            Some(error) => println!(
                "[{}/{}] {} FAILED: {}",
                index + 1,
                total,
                record.deposit_id,
                error
            ),
        }
        results.push(result);
    }

    results
}

async fn withdraw_one<S: PrivacySdk>(
    sdk: &mut S,
    record: &CanonicalDepositRecord,
    settings: &DriverSettings,
) -> WithdrawalResult {
    let identifier = derive_withdrawal_identifier(record);
    let recipients = recipients_for(record, settings);
    let timestamp = now_millis();

    match attempt(sdk, record, &identifier, &recipients, settings.call_timeout).await {
        Ok(transaction_hash) => WithdrawalResult {
            deposit_id: record.deposit_id.clone(),
            success: true,
            error: None,
            transaction_hash,
            timestamp,
        },
        Err(e) => WithdrawalResult {
            deposit_id: record.deposit_id.clone(),
            success: false,
            error: Some(e.to_string()),
            transaction_hash: None,
            timestamp,
        },
    }
}

/// The per-record state machine: init, request calldata, execute. The first
/// error wins; calldata-validation failures and execution failures are not
/// distinguished in the result.
async fn attempt<S: PrivacySdk>(
    sdk: &mut S,
    record: &CanonicalDepositRecord,
    identifier: &str,
    recipients: &[String],
    timeout: Duration,
) -> Result<Option<String>, SdkError> {
    bounded(
        timeout,
        "init",
        sdk.init(
            &record.privacy.secrets,
            &record.privacy.nullifiers,
            &record.privacy.pools,
        ),
    )
    .await?;
    bounded(
        timeout,
        "getWithdrawCalldata",
        sdk.get_withdraw_calldata(identifier, recipients),
    )
    .await?;
    bounded(timeout, "withdraw", sdk.withdraw(identifier, recipients)).await
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, SdkError>>,
) -> Result<T, SdkError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SdkError::Timeout {
            operation,
            seconds: limit.as_secs(),
        }),
    }
}

fn recipients_for(record: &CanonicalDepositRecord, settings: &DriverSettings) -> Vec<String> {
    record
        .privacy
        .swap_params
        .as_ref()
        .and_then(|swap| swap.recipient_address.clone())
        .or_else(|| settings.default_recipient.clone())
        .into_iter()
        .collect()
}

/// Human-readable listing for `--dry-run`: every record with the identifier
/// and recipients a live run would use. No SDK involvement.
pub fn render_dry_run(store: &UnifiedStore) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "DRY RUN: {} deposit(s) in canonical set (generated {})",
        store.deposits.len(),
        store.meta.generated_at
    );
    for (index, record) in store.deposits.iter().enumerate() {
        let recipients = record
            .privacy
            .swap_params
            .as_ref()
            .and_then(|swap| swap.recipient_address.as_deref())
            .unwrap_or("-");
        let _ = writeln!(
            out,
            "  {}. {} status={} identifier={} recipient={} source={}",
            index + 1,
            record.deposit_id,
            record.status,
            derive_withdrawal_identifier(record),
            recipients,
            record.source
        );
    }
    let _ = writeln!(out, "No SDK calls were made and no results file was written.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreMeta;
    use crate::types::{DepositStatus, PrivacyMaterial};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    fn record(id: &str) -> CanonicalDepositRecord {
        CanonicalDepositRecord {
            deposit_id: id.to_string(),
            tx_hash: format!("0x{}1234567890", id),
            wallet_address: "0xWallet".to_string(),
            token_address: "0xToken".to_string(),
            amount: "1".to_string(),
            timestamp: 1700000000000,
            status: DepositStatus::Pending,
            privacy: PrivacyMaterial {
                secrets: vec!["s".to_string()],
                nullifiers: vec!["n".to_string()],
                pools: vec!["p".to_string()],
                ..PrivacyMaterial::default()
            },
            source: "test.json".to_string(),
        }
    }

    fn fast_settings() -> DriverSettings {
        DriverSettings {
            record_delay: Duration::ZERO,
            call_timeout: Duration::from_secs(5),
            default_recipient: None,
        }
    }

    /// Scripted SDK: optionally fails the k-th withdraw (1-indexed) or
    /// hangs on every withdraw.
    struct MockSdk {
        init_calls: usize,
        calldata_calls: usize,
        withdraw_calls: usize,
        fail_withdraw_at: Option<usize>,
        hang_on_withdraw: bool,
    }

    impl MockSdk {
        fn new() -> Self {
            Self {
                init_calls: 0,
                calldata_calls: 0,
                withdraw_calls: 0,
                fail_withdraw_at: None,
                hang_on_withdraw: false,
            }
        }
    }

    #[async_trait]
    impl PrivacySdk for MockSdk {
        async fn init(
            &mut self,
            _secrets: &[String],
            _nullifiers: &[String],
            _pools: &[String],
        ) -> Result<(), SdkError> {
            self.init_calls += 1;
            Ok(())
        }

        async fn get_withdraw_calldata(
            &mut self,
            _identifier: &str,
            _recipients: &[String],
        ) -> Result<Value, SdkError> {
            self.calldata_calls += 1;
            Ok(json!({"calldata": "0xopaque"}))
        }

        async fn withdraw(
            &mut self,
            _identifier: &str,
            _recipients: &[String],
        ) -> Result<Option<String>, SdkError> {
            if self.hang_on_withdraw {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.withdraw_calls += 1;
            if self.fail_withdraw_at == Some(self.withdraw_calls) {
                return Err(SdkError::Rejected {
                    operation: "withdraw",
                    message: "proof rejected by pool".to_string(),
                });
            }
            Ok(Some(format!("0xtx{}", self.withdraw_calls)))
        }
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_the_batch() {
        let deposits = vec![record("a"), record("b"), record("c"), record("d")];
        let mut sdk = MockSdk::new();
        sdk.fail_withdraw_at = Some(2);

        let results = run_batch(&mut sdk, &deposits, &fast_settings()).await;

        assert_eq!(results.len(), 4);
        let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].deposit_id, "b");
        assert!(failed[0].error.as_deref().unwrap().contains("proof rejected"));
        assert!(results[0].success && results[2].success && results[3].success);
        assert!(results[0].transaction_hash.is_some());
    }

    #[tokio::test]
    async fn test_results_keep_canonical_set_order() {
        let deposits = vec![record("z"), record("a"), record("m")];
        let mut sdk = MockSdk::new();

        let results = run_batch(&mut sdk, &deposits, &fast_settings()).await;
        let ids: Vec<_> = results.iter().map(|r| r.deposit_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
        assert_eq!(sdk.init_calls, 3);
        assert_eq!(sdk.calldata_calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_sdk_call_becomes_failed_result() {
        let deposits = vec![record("a"), record("b")];
        let mut sdk = MockSdk::new();
        sdk.hang_on_withdraw = true;

        let settings = DriverSettings {
            record_delay: Duration::ZERO,
            call_timeout: Duration::from_secs(1),
            default_recipient: None,
        };
        let results = run_batch(&mut sdk, &deposits, &settings).await;

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(!result.success);
            assert!(result.error.as_deref().unwrap().contains("timed out"));
        }
    }

    #[tokio::test]
    async fn test_record_recipient_wins_over_default() {
        let mut with_recipient = record("a");
        with_recipient.privacy.swap_params = Some(crate::types::SwapParams {
            recipient_address: Some("0xFromRecord".to_string()),
            ..Default::default()
        });
        let settings = DriverSettings {
            default_recipient: Some("0xDefault".to_string()),
            ..fast_settings()
        };

        assert_eq!(
            recipients_for(&with_recipient, &settings),
            vec!["0xFromRecord".to_string()]
        );
        assert_eq!(
            recipients_for(&record("b"), &settings),
            vec!["0xDefault".to_string()]
        );
        assert!(recipients_for(&record("c"), &fast_settings()).is_empty());
    }

    #[test]
    fn test_dry_run_lists_every_record() {
        let store = UnifiedStore {
            meta: StoreMeta {
                total_deposits: 3,
                generated_at: "2026-08-29T00:00:00Z".to_string(),
                source_files: vec!["test.json".to_string()],
            },
            deposits: vec![record("a"), record("b"), record("c")],
        };

        let listing = render_dry_run(&store);
        for id in ["a", "b", "c"] {
            assert!(listing.contains(id));
        }
        assert!(listing.contains("3 deposit(s)"));
        assert!(listing.contains("No SDK calls"));
    }
}
