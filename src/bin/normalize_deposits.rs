//! Normalizes the declared deposit exports into the unified canonical set.
//!
//! First half of the pipeline: read every declared export, normalize, apply
//! the acceptance filter, and write the canonical set for inspection. Never
//! touches the SDK or the chain.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use typhoon_reconcile::{filter_eligible, normalize_sources, write_unified, ReconcileConfig};

#[derive(Debug, Parser)]
#[command(
    name = "normalize_deposits",
    about = "Normalize deposit exports into the unified canonical set"
)]
struct Cli {
    /// Path to the pipeline config file (defaults to ./reconcile.json when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = ReconcileConfig::load(cli.config.as_deref())?;

    println!("Normalizing {} source file(s)", config.sources.len());
    let outcome = normalize_sources(&config.sources);
    for stat in &outcome.stats {
        println!(
            "  {}: {} normalized, {} skipped",
            stat.source, stat.parsed, stat.skipped
        );
    }
    for failed in &outcome.failed_files {
        println!("  {}: unreadable, contributed no records", failed);
    }

    let total = outcome.records.len();
    let eligible = filter_eligible(outcome.records);
    println!(
        "{} of {} normalized record(s) eligible for withdrawal",
        eligible.len(),
        total
    );

    let store = write_unified(&config.unified_path, eligible, outcome.source_files)?;
    println!(
        "Wrote {} deposit(s) to {}",
        store.meta.total_deposits,
        config.unified_path.display()
    );
    println!("Inspect the canonical set, then run batch_withdraw.");
    Ok(())
}
