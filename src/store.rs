//! Unified canonical-set persistence
//!
//! The file boundary between the two pipeline runs. Each normalize run fully
//! replaces the previous canonical set; writes go to a sibling temp file and
//! are renamed into place so a crash mid-write leaves the old file intact.

use crate::types::CanonicalDepositRecord;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run metadata carried alongside the canonical record list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub total_deposits: usize,
    /// ISO-8601 UTC.
    pub generated_at: String,
    pub source_files: Vec<String>,
}

/// On-disk shape of the canonical set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedStore {
    pub meta: StoreMeta,
    pub deposits: Vec<CanonicalDepositRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("canonical set not found at {0}; run normalize_deposits first")]
    Missing(PathBuf),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid store file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Writes the canonical set, replacing any previous file at `path`.
pub fn write_unified(
    path: &Path,
    deposits: Vec<CanonicalDepositRecord>,
    source_files: Vec<String>,
) -> Result<UnifiedStore, StoreError> {
    let store = UnifiedStore {
        meta: StoreMeta {
            total_deposits: deposits.len(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source_files,
        },
        deposits,
    };
    write_json_atomic(path, &store)?;
    Ok(store)
}

/// Loads the canonical set back for the withdrawal run. A missing file is a
/// fatal setup error, reported as such to the operator.
pub fn read_unified(path: &Path) -> Result<UnifiedStore, StoreError> {
    if !path.exists() {
        return Err(StoreError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Serializes the whole value into one buffer, writes it to a sibling temp
/// path and renames over the target. No incremental streaming.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
