//! Log output configuration.

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Tracing subscriber configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,
}

impl TelemetryConfig {
    /// Initializes tracing with environment-based filtering.
    ///
    /// The filter comes from `RUST_LOG` and defaults to `info`.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init(),
        }
        .context("failed to initialize tracing")
    }
}
