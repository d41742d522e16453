//! Pipeline configuration
//!
//! Everything an operator can tune: which export files to read and their
//! declared formats, where the canonical set and results land, the SDK
//! endpoint, and the driver's pacing/timeout knobs. Loaded from a JSON file
//! when one is given or present, otherwise the defaults below apply.

use crate::normalize::SourceFormat;
use crate::withdraw::DriverSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One declared export file with its format tag. Dispatch is keyed by this
/// tag, never by position, so adding a format does not reorder anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileConfig {
    pub sources: Vec<SourceFile>,
    /// Durable canonical set shared between the two runs.
    pub unified_path: PathBuf,
    pub results_path: PathBuf,
    /// Typhoon SDK sidecar endpoint.
    pub sdk_url: String,
    pub call_timeout_secs: u64,
    pub record_delay_ms: u64,
    pub default_recipient: Option<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceFile {
                    path: PathBuf::from("exports/deposits_backup.json"),
                    format: SourceFormat::DepositBackup,
                },
                SourceFile {
                    path: PathBuf::from("exports/swap_backup.json"),
                    format: SourceFormat::SwapBackup,
                },
                SourceFile {
                    path: PathBuf::from("exports/typhoon_localstorage.json"),
                    format: SourceFormat::LegacyStorage,
                },
            ],
            unified_path: PathBuf::from("unified_deposits.json"),
            results_path: PathBuf::from("withdrawal_results.json"),
            sdk_url: "http://127.0.0.1:8787".to_string(),
            call_timeout_secs: 60,
            record_delay_ms: 2000,
            default_recipient: None,
        }
    }
}

/// Config file picked up automatically when no --config flag is given.
const DEFAULT_CONFIG_PATH: &str = "reconcile.json";

impl ReconcileConfig {
    /// Loads the config. An explicitly named file must exist and parse; the
    /// implicit `reconcile.json` is optional and falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_PATH);
                if implicit.exists() {
                    Self::from_file(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn driver_settings(&self) -> DriverSettings {
        DriverSettings {
            record_delay: Duration::from_millis(self.record_delay_ms),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            default_recipient: self.default_recipient.clone(),
        }
    }
}
