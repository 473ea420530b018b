//! `residence-service` entry point.
//!
//! ## Modes
//!
//! - **Service mode** (default): run the daily attendance scheduler until
//!   Ctrl+C / SIGTERM.
//! - **`--reconcile-now`**: reconcile one day (today unless `--date` is
//!   given), print the summary and exit. Non-zero exit if any resident
//!   could not be marked.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use residence_rules::RulesEngine;
use residence_service::config::ServiceConfig;
use residence_service::scheduler::{self, Scheduler};

#[derive(Parser, Debug)]
#[command(version, about = "Residence rules service: daily attendance reconciliation")]
struct Args {
    /// Config file (default: $RESIDENCE_CONFIG or <config dir>/residence/service.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reconcile once and exit instead of running the scheduler
    #[arg(long)]
    reconcile_now: bool,

    /// Day to reconcile with --reconcile-now
    #[arg(long, value_name = "YYYY-MM-DD", requires = "reconcile_now")]
    date: Option<NaiveDate>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::load(args.config.as_deref()).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("residence-service v{} starting", env!("CARGO_PKG_VERSION"));

    let engine = residence_service::open_engine(&config).context("opening residence store")?;

    if args.reconcile_now {
        return reconcile_once(&engine, args.date);
    }

    run_service(engine, &config)
}

fn reconcile_once(engine: &RulesEngine, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| engine.clock().today());
    let report = engine
        .reconcile(date)
        .with_context(|| format!("reconciling attendance for {date}"))?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{date}: {} active, {} marked absent, {} already recorded, {} failed",
            report.active_count,
            report.marked_absent_count,
            report.already_recorded_count(),
            report.failed.len(),
        );
    }

    if !report.is_complete() {
        anyhow::bail!(
            "{} resident(s) could not be marked for {date}",
            report.failed.len()
        );
    }
    Ok(())
}

#[tokio::main]
async fn run_service(engine: Arc<RulesEngine>, config: &ServiceConfig) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Signal received, shutting down");
        let _ = shutdown_tx.send(true);
    });

    if !config.scheduler.enabled {
        tracing::info!("Scheduler disabled in config; waiting for shutdown");
        let mut rx = shutdown_rx;
        let _ = rx.wait_for(|stop| *stop).await;
        return Ok(());
    }

    let reconcile_at = config
        .scheduler
        .reconcile_time()
        .context("reading scheduler.reconcile_at")?;
    scheduler::run(
        engine,
        Scheduler::new(reconcile_at),
        config.scheduler.poll_interval(),
        shutdown_rx,
    )
    .await;

    tracing::info!("residence-service exiting cleanly");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
