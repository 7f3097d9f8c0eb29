#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod runtime;

use std::process;

use anyhow::Context;
use docval_worker::{ValidationWorker, WorkerState};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "docval_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "docval_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "docval_cli::config";
pub const TRACING_TARGET_METRICS: &str = "docval_cli::metrics";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    cli.telemetry.init_tracing()?;
    cli.log();
    cli.validate()?;

    let (state, subscriber) = WorkerState::from_config(&cli.worker)
        .await
        .context("failed to connect collaborators")?;

    let cancel_token = CancellationToken::new();
    let _signal_listener = runtime::spawn_signal_listener(cancel_token.clone());

    let reporter = cli.worker.metrics_interval().map(|interval| {
        runtime::spawn_metrics_reporter(
            state.metrics.clone(),
            interval,
            cancel_token.child_token(),
        )
    });

    let worker = ValidationWorker::new(state.clone(), cancel_token.clone());
    let result = worker.spawn(subscriber).await;

    // The worker may stop on its own; make sure the reporter follows.
    cancel_token.cancel();
    if let Some(reporter) = reporter
        && let Err(error) = reporter.await
    {
        tracing::warn!(
            target: TRACING_TARGET_METRICS,
            error = %error,
            "Metrics reporter did not stop cleanly"
        );
    }

    state.shutdown().await;

    result
        .context("validation worker task failed")?
        .context("validation worker stopped with an error")
}
