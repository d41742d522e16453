//! Result aggregation and reporting
//!
//! Aggregates the per-record results into counts, persists the results file
//! with the same temp-and-rename discipline as the canonical set, and prints
//! the operator summary. A partial-failure run is signalled to the caller
//! through a non-zero process exit, decided by the binary from the failed
//! count here.

use crate::store::{write_json_atomic, StoreError};
use crate::types::WithdrawalResult;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// ISO-8601 UTC.
    pub generated_at: String,
}

/// On-disk shape of the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalReport {
    pub meta: ReportMeta,
    pub results: Vec<WithdrawalResult>,
}

/// Folds the raw result list into the report shape.
pub fn build_report(results: Vec<WithdrawalResult>) -> WithdrawalReport {
    let successful = results.iter().filter(|r| r.success).count();
    WithdrawalReport {
        meta: ReportMeta {
            total_processed: results.len(),
            successful,
            failed: results.len() - successful,
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        },
        results,
    }
}

pub fn write_report(path: &Path, report: &WithdrawalReport) -> Result<(), StoreError> {
    write_json_atomic(path, report)
}

/// Operator-facing summary; failures are itemized by deposit id and reason
/// so a human can re-run just the failed subset.
pub fn print_summary(report: &WithdrawalReport) {
    println!();
    println!(
        "Processed {} withdrawal(s): {} successful, {} failed",
        report.meta.total_processed, report.meta.successful, report.meta.failed
    );
    if report.meta.failed == 0 {
        println!("All withdrawals completed.");
        return;
    }
    println!("Failures:");
    for result in report.results.iter().filter(|r| !r.success) {
        println!(
            "  {}: {}",
            result.deposit_id,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result(id: &str, success: bool) -> WithdrawalResult {
        WithdrawalResult {
            deposit_id: id.to_string(),
            success,
            error: (!success).then(|| "proof rejected by pool".to_string()),
            transaction_hash: success.then(|| format!("0xtx_{}", id)),
            timestamp: 1700000000000,
        }
    }

    #[test]
    fn test_counts_add_up() {
        let report = build_report(vec![
            result("a", true),
            result("b", false),
            result("c", true),
        ]);
        assert_eq!(report.meta.total_processed, 3);
        assert_eq!(report.meta.successful, 2);
        assert_eq!(report.meta.failed, 1);
        assert_eq!(report.results.len(), 3);
    }

    #[test]
    fn test_empty_batch_reports_zero_everything() {
        let report = build_report(Vec::new());
        assert_eq!(report.meta.total_processed, 0);
        assert_eq!(report.meta.failed, 0);
    }

    #[test]
    fn test_report_round_trips_through_results_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("withdrawal_results.json");
        let report = build_report(vec![result("a", true), result("b", false)]);

        write_report(&path, &report).unwrap();
        let loaded: WithdrawalReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
        assert!(!dir.path().join("withdrawal_results.json.tmp").exists());
    }
}
