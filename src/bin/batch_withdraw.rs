//! Executes withdrawals for every deposit in the unified canonical set.
//!
//! Second half of the pipeline. Reads the canonical set written by
//! normalize_deposits, then drives one withdrawal per record through the
//! Typhoon SDK, strictly sequentially. `--dry-run` lists the records without
//! touching the SDK. Exit code is 0 only when every record succeeded.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use typhoon_reconcile::{
    build_report, print_summary, read_unified, render_dry_run, run_batch, write_report,
    ReconcileConfig, TyphoonClient,
};

#[derive(Debug, Parser)]
#[command(
    name = "batch_withdraw",
    about = "Execute withdrawals for every deposit in the unified canonical set"
)]
struct Cli {
    /// Path to the pipeline config file (defaults to ./reconcile.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the deposits that would be withdrawn; performs no SDK calls and
    /// writes no results file
    #[arg(long)]
    dry_run: bool,

    /// Seconds to count down before the first on-chain call
    #[arg(long, default_value_t = 5)]
    countdown: u64,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ReconcileConfig::load(cli.config.as_deref())?;
    let store = read_unified(&config.unified_path)?;

    if cli.dry_run {
        print!("{}", render_dry_run(&store));
        return Ok(());
    }

    if store.deposits.is_empty() {
        println!("Canonical set is empty, nothing to withdraw.");
        return Ok(());
    }

    println!(
        "About to execute withdrawals for {} deposit(s) from {} (generated {}).",
        store.deposits.len(),
        config.unified_path.display(),
        store.meta.generated_at
    );
    countdown(cli.countdown).await;

    let mut sdk = TyphoonClient::connect(&config.sdk_url)
        .await
        .context("typhoon sdk is not reachable, no withdrawals were attempted")?;

    let results = run_batch(&mut sdk, &store.deposits, &config.driver_settings()).await;
    let report = build_report(results);
    write_report(&config.results_path, &report)?;
    println!("Results written to {}", config.results_path.display());
    print_summary(&report);

    if report.meta.failed > 0 {
        anyhow::bail!("{} withdrawal(s) failed", report.meta.failed);
    }
    Ok(())
}

async fn countdown(seconds: u64) {
    if seconds == 0 {
        return;
    }
    println!("Press Ctrl+C to abort.");
    for remaining in (1..=seconds).rev() {
        println!("  starting in {}...", remaining);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
