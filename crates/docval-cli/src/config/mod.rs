//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── worker: WorkerConfig        # NATS, streams, shards, object store, rules
//! └── telemetry: TelemetryConfig  # log output format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod telemetry;

use std::process;

use anyhow::Context;
use clap::Parser;
use docval_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
pub use telemetry::{LogFormat, TelemetryConfig};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "docval")]
#[command(about = "Validates DOCX documents delivered over NATS and stores accepted ones")]
#[command(version)]
pub struct Cli {
    /// Worker and collaborator configuration.
    #[clap(flatten)]
    pub worker: WorkerConfig,

    /// Log output configuration.
    #[clap(flatten)]
    pub telemetry: TelemetryConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.worker
            .validate()
            .context("invalid worker configuration")
    }

    /// Logs the configuration without credentials.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting docval worker"
        );

        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        let worker = &self.worker;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            nats_servers = ?worker.nats.servers(),
            inbound_stream = %worker.streams.inbound_stream,
            inbound_subject = %worker.streams.inbound_subject,
            consumer = %worker.streams.consumer_name,
            response_subject = %worker.streams.response_subject,
            cache_bucket = %worker.streams.cache_bucket,
            "Messaging configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            shards = worker.shards.postgres_shards.len(),
            postgres_max_connections = worker.shards.postgres_max_connections,
            postgres_virtual_nodes = worker.shards.postgres_virtual_nodes,
            postgres_run_migrations = worker.shards.postgres_run_migrations,
            object_store_endpoint = %worker.object_store.endpoint,
            object_store_bucket = %worker.object_store.bucket,
            "Storage configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            target_script = %worker.validation.target_script,
            min_script_percent = worker.validation.min_script_percent,
            max_date_spread_days = worker.validation.max_date_spread_days,
            metrics_interval_secs = worker.metrics_interval_secs,
            "Worker configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const REQUIRED: [&str; 7] = [
        "docval",
        "--postgres-shards",
        "a=postgresql://localhost/a,b=postgresql://localhost/b",
        "--object-store-endpoint",
        "http://127.0.0.1:9000",
        "--object-store-bucket",
        "documents",
    ];

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        assert_eq!(cli.worker.shards.postgres_shards.len(), 2);
        assert_eq!(cli.worker.metrics_interval_secs, 60);
        assert_eq!(cli.worker.streams.inbound_subject, "documents.validate");
        assert_eq!(cli.telemetry.log_format, LogFormat::Text);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_json_format() {
        let cli = Cli::try_parse_from(REQUIRED.into_iter().chain(["--log-format", "json"]))
            .unwrap();
        assert_eq!(cli.telemetry.log_format, LogFormat::Json);
    }
}
