//! Typhoon deposit reconciliation and batch-withdrawal pipeline
//!
//! Two decoupled operator runs share one durable file: `normalize_deposits`
//! turns heterogeneous deposit exports into the unified canonical set, and
//! `batch_withdraw` drives withdrawals for that set through the Typhoon SDK
//! and writes a per-record results file. The file boundary exists so a human
//! can inspect the canonical set before authorizing any on-chain call.

pub mod config;
pub mod normalize;
pub mod sdk;
pub mod store;
pub mod types;
pub mod withdraw;

// Re-export main types
pub use config::{ReconcileConfig, SourceFile};
pub use normalize::{filter_eligible, normalize_sources, NormalizeOutcome, SourceFormat};
pub use sdk::{PrivacySdk, SdkError, TyphoonClient};
pub use store::{read_unified, write_unified, StoreError, StoreMeta, UnifiedStore};
pub use types::{
    CanonicalDepositRecord, DepositStatus, PrivacyMaterial, RejectionReason, SwapParams,
    WithdrawalResult,
};
pub use withdraw::report::{build_report, print_summary, write_report, WithdrawalReport};
pub use withdraw::{derive_withdrawal_identifier, render_dry_run, run_batch, DriverSettings};
