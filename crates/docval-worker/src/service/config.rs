//! Worker configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use docval_document::ValidationConfig;
use docval_nats::{NatsConfig, StreamConfig};
use docval_postgres::ShardsConfig;
use docval_reqwest::ObjectStoreConfig;
use serde::{Deserialize, Serialize};

use crate::{Result, WorkerError};

/// Default interval between periodic metrics snapshots, in seconds.
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 60;

/// Complete worker configuration.
///
/// Combines connection configuration for every collaborator with the
/// validation thresholds. This is the main configuration type passed to
/// [`WorkerState::from_config`].
///
/// [`WorkerState::from_config`]: super::WorkerState::from_config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkerConfig {
    /// NATS connection configuration.
    #[cfg_attr(feature = "config", command(flatten))]
    pub nats: NatsConfig,

    /// Inbound stream, response stream and cache bucket names.
    #[cfg_attr(feature = "config", command(flatten))]
    pub streams: StreamConfig,

    /// Storage partitions.
    #[cfg_attr(feature = "config", command(flatten))]
    pub shards: ShardsConfig,

    /// Object store endpoint and bucket.
    #[cfg_attr(feature = "config", command(flatten))]
    pub object_store: ObjectStoreConfig,

    /// Document validation thresholds.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Interval between metrics snapshots in the log, in seconds (0 disables).
    #[cfg_attr(
        feature = "config",
        arg(
            long = "worker-metrics-interval-secs",
            env = "WORKER_METRICS_INTERVAL_SECS",
            default_value_t = DEFAULT_METRICS_INTERVAL_SECS
        )
    )]
    #[serde(default = "default_metrics_interval_secs")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval_secs() -> u64 {
    DEFAULT_METRICS_INTERVAL_SECS
}

impl WorkerConfig {
    /// Creates a new worker configuration with default streams and thresholds.
    pub fn new(nats: NatsConfig, shards: ShardsConfig, object_store: ObjectStoreConfig) -> Self {
        Self {
            nats,
            streams: StreamConfig::default(),
            shards,
            object_store,
            validation: ValidationConfig::default(),
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
        }
    }

    /// Sets the validation thresholds.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Returns the metrics snapshot interval, or `None` when disabled.
    pub fn metrics_interval(&self) -> Option<Duration> {
        (self.metrics_interval_secs > 0).then(|| Duration::from_secs(self.metrics_interval_secs))
    }

    /// Checks every section before any connection is attempted.
    pub fn validate(&self) -> Result<()> {
        self.nats.validate()?;
        self.streams.validate()?;
        self.shards.validate()?;
        self.object_store.validate()?;
        self.validation
            .validate()
            .map_err(|e| WorkerError::configuration_with_source("invalid validation thresholds", e))?;

        Ok(())
    }
}
