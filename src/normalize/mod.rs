//! Source export normalization
//!
//! Each exported file is declared with an explicit [`SourceFormat`] tag and
//! handed to that format's parser; a malformed file is logged and skipped
//! without failing the run. Parsers reject individual records with a
//! [`RejectionReason`](crate::types::RejectionReason) and never abort a file.

pub mod deposit_backup;
pub mod filter;
pub mod legacy_storage;
pub mod swap_backup;

pub use filter::{eligibility, filter_eligible};

use crate::config::SourceFile;
use crate::types::{now_millis, CanonicalDepositRecord, DepositStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

/// Declared shape of a source export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Wallet-keyed map of deposit arrays with a full `typhoonData` object
    /// (secrets/nullifiers/pools, optional note and swap params).
    DepositBackup,
    /// Same layout as `DepositBackup` but amounts may be JSON numbers and
    /// there is no note field.
    SwapBackup,
    /// Raw localStorage dump mixing wallet-keyed swap arrays with flat,
    /// id-keyed pending-deposit objects.
    LegacyStorage,
}

/// Per-file normalization counters, reported to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub source: String,
    pub parsed: usize,
    pub skipped: usize,
}

/// Everything a normalize run produced.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Canonical records in source-file order, then within-file encounter
    /// order.
    pub records: Vec<CanonicalDepositRecord>,
    /// Files that contributed records (readable, valid JSON).
    pub source_files: Vec<String>,
    pub stats: Vec<FileStats>,
    /// Files that could not be read or parsed at all.
    pub failed_files: Vec<String>,
}

/// Normalizes every declared source file into one canonical record list.
///
/// Fail-soft at file granularity: an unreadable or malformed file is logged,
/// contributes zero records, and the run continues.
pub fn normalize_sources(sources: &[SourceFile]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for source in sources {
        let name = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.path.display().to_string());

        let root: Value = match fs::read_to_string(&source.path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
        {
            Ok(v) => v,
            Err(e) => {
                log::error!("skipping source file {}: {}", name, e);
                outcome.failed_files.push(name);
                continue;
            }
        };

        let (records, skipped) = match source.format {
            SourceFormat::DepositBackup => deposit_backup::parse_file(&root, &name),
            SourceFormat::SwapBackup => swap_backup::parse_file(&root, &name),
            SourceFormat::LegacyStorage => legacy_storage::parse_file(&root, &name),
        };

        log::info!(
            "{}: {} record(s) normalized, {} skipped",
            name,
            records.len(),
            skipped
        );
        outcome.stats.push(FileStats {
            source: name.clone(),
            parsed: records.len(),
            skipped,
        });
        outcome.source_files.push(name);
        outcome.records.extend(records);
    }

    outcome
}

/// String field lookup; missing or non-string values become "".
pub(crate) fn json_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Amount coercion: strings pass through, numbers become their decimal
/// string representation (serde_json keeps integers exact and renders
/// floats with the shortest round-trip form).
pub(crate) fn decimal_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Collects a JSON array of strings; missing fields and non-string elements
/// are dropped.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Epoch-millisecond timestamp; falls back to the current clock when the
/// export has none.
pub(crate) fn epoch_millis(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or_else(now_millis)
}

pub(crate) fn parse_status(value: Option<&Value>) -> DepositStatus {
    match value.and_then(Value::as_str) {
        Some("pending") | None => DepositStatus::Pending,
        Some("available") => DepositStatus::Available,
        Some("withdrawn") => DepositStatus::Withdrawn,
        Some(other) => {
            log::warn!("unknown deposit status `{}`, treating as pending", other);
            DepositStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &std::path::Path, name: &str, value: &Value) -> SourceFile {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        SourceFile {
            path,
            format: match name {
                n if n.contains("deposit") => SourceFormat::DepositBackup,
                n if n.contains("swap") => SourceFormat::SwapBackup,
                _ => SourceFormat::LegacyStorage,
            },
        }
    }

    fn three_source_files(dir: &std::path::Path) -> Vec<SourceFile> {
        let deposit = json!({
            "0xWalletA": [{
                "depositId": "dep_a1",
                "txHash": "0xaaaa11112222",
                "tokenAddress": "0xToken",
                "amount": "1000000",
                "timestamp": 1700000000000u64,
                "status": "pending",
                "typhoonData": {
                    "secrets": ["s1"],
                    "nullifiers": ["n1"],
                    "pools": ["p1"],
                    "note": "typhoon-poolA-s1"
                }
            }]
        });
        let swap = json!({
            "0xWalletB": [{
                "txHash": "0xbbbb33334444",
                "tokenAddress": "0xToken",
                "amount": 2500000u64,
                "timestamp": 1700000001000u64,
                "status": "available",
                "typhoonData": {
                    "secrets": ["s2"],
                    "nullifiers": ["n2"],
                    "pools": ["p2"]
                }
            }]
        });
        let legacy = json!({
            "dep_c1": {
                "secrets": ["s3"],
                "nullifiers": ["n3"],
                "pools": ["p3"],
                "transactionHash": "0xcccc55556666",
                "walletAddress": "0xWalletC",
                "tokenAddress": "0xToken",
                "amount": "42",
                "timestamp": 1700000002000u64,
                "pendingUserDeposit": true
            }
        });
        vec![
            write_file(dir, "deposits_backup.json", &deposit),
            write_file(dir, "swap_backup.json", &swap),
            write_file(dir, "typhoon_localstorage.json", &legacy),
        ]
    }

    #[test]
    fn test_three_file_scenario_yields_two_eligible_records() {
        let dir = tempdir().unwrap();
        let sources = three_source_files(dir.path());

        let outcome = normalize_sources(&sources);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.source_files.len(), 3);

        let eligible = filter_eligible(outcome.records);
        assert_eq!(eligible.len(), 2);
        assert_eq!(eligible[0].deposit_id, "dep_a1");
        assert_eq!(eligible[1].deposit_id, "dep_c1");
        assert_eq!(eligible[1].status, DepositStatus::Pending);
    }

    #[test]
    fn test_malformed_file_is_skipped_without_failing_the_run() {
        let dir = tempdir().unwrap();
        let mut sources = three_source_files(dir.path());

        let broken = dir.path().join("broken_deposits.json");
        let mut f = fs::File::create(&broken).unwrap();
        f.write_all(b"{ not json").unwrap();
        sources.push(SourceFile {
            path: broken,
            format: SourceFormat::DepositBackup,
        });

        let outcome = normalize_sources(&sources);
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.failed_files, vec!["broken_deposits.json"]);
        assert_eq!(outcome.source_files.len(), 3);
    }

    #[test]
    fn test_normalization_is_idempotent_over_unchanged_sources() {
        let dir = tempdir().unwrap();
        let sources = three_source_files(dir.path());

        let first = filter_eligible(normalize_sources(&sources).records);
        let second = filter_eligible(normalize_sources(&sources).records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_source_file_contributes_nothing() {
        let outcome = normalize_sources(&[SourceFile {
            path: "/nonexistent/exports.json".into(),
            format: SourceFormat::DepositBackup,
        }]);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failed_files.len(), 1);
    }

    #[test]
    fn test_decimal_string_keeps_integer_and_float_magnitudes() {
        assert_eq!(
            decimal_string(Some(&json!("1500000000000000000"))),
            "1500000000000000000"
        );
        assert_eq!(decimal_string(Some(&json!(2500000u64))), "2500000");
        assert_eq!(decimal_string(Some(&json!(0.5))), "0.5");
        assert_eq!(decimal_string(None), "");
    }
}
