//! Partition list configuration.

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_VIRTUAL_NODES, StorageError, StorageResult};
use crate::PgConfig;

/// Storage partitions and their shared pool settings.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ShardsConfig {
    /// Comma separated partitions, each `name=url` or a bare `url`
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-shards",
            env = "POSTGRES_SHARDS",
            value_delimiter = ',',
            required = true
        )
    )]
    pub postgres_shards: Vec<String>,

    /// Maximum number of connections in each partition pool
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-max-connections",
            env = "POSTGRES_MAX_CONNECTIONS",
            default_value = "10"
        )
    )]
    pub postgres_max_connections: u32,

    /// Connection timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-connection-timeout-secs",
            env = "POSTGRES_CONNECTION_TIMEOUT_SECS"
        )
    )]
    pub postgres_connection_timeout_secs: Option<u64>,

    /// Idle connection timeout in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-idle-timeout-secs",
            env = "POSTGRES_IDLE_TIMEOUT_SECS"
        )
    )]
    pub postgres_idle_timeout_secs: Option<u64>,

    /// Virtual nodes placed on the ring per partition
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-virtual-nodes",
            env = "POSTGRES_VIRTUAL_NODES",
            default_value_t = DEFAULT_VIRTUAL_NODES
        )
    )]
    pub postgres_virtual_nodes: u16,

    /// Apply embedded migrations to every partition at startup
    #[cfg_attr(
        feature = "config",
        arg(
            long = "postgres-run-migrations",
            env = "POSTGRES_RUN_MIGRATIONS",
            default_value_t = false
        )
    )]
    pub postgres_run_migrations: bool,
}

/// One parsed partition entry.
#[derive(Debug, Clone)]
pub struct ShardEntry {
    pub name: String,
    pub config: PgConfig,
}

impl ShardsConfig {
    /// Creates a configuration from raw `name=url` or `url` entries.
    pub fn new<I, S>(shards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            postgres_shards: shards.into_iter().map(Into::into).collect(),
            postgres_max_connections: 10,
            postgres_connection_timeout_secs: None,
            postgres_idle_timeout_secs: None,
            postgres_virtual_nodes: DEFAULT_VIRTUAL_NODES,
            postgres_run_migrations: false,
        }
    }

    /// Enables migrations at startup.
    #[must_use]
    pub fn with_run_migrations(mut self, run: bool) -> Self {
        self.postgres_run_migrations = run;
        self
    }

    /// Parses the partition list in declaration order.
    ///
    /// Blank entries are skipped. An entry is named when the text before the
    /// first `=` contains neither `:` nor `/`; otherwise the whole entry is
    /// the URL and the partition is called `shard{index}`.
    pub fn shard_entries(&self) -> StorageResult<Vec<ShardEntry>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        let raw = self
            .postgres_shards
            .iter()
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty());

        for (index, raw) in raw.enumerate() {
            let (name, url) = match raw.split_once('=') {
                Some((name, url)) if !name.contains([':', '/']) => {
                    (name.trim().to_owned(), url.trim())
                }
                _ => (format!("shard{index}"), raw),
            };

            if name.is_empty() {
                return Err(StorageError::InvalidConfig(format!(
                    "entry {index} has an empty shard name"
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(StorageError::DuplicateShard(name));
            }

            let mut config =
                PgConfig::new(url).with_max_connections(self.postgres_max_connections);
            config.postgres_connection_timeout_secs = self.postgres_connection_timeout_secs;
            config.postgres_idle_timeout_secs = self.postgres_idle_timeout_secs;

            config.validate().map_err(|e| {
                StorageError::InvalidConfig(format!("shard {name}: {e}"))
            })?;
            entries.push(ShardEntry { name, config });
        }

        if entries.is_empty() {
            return Err(StorageError::InvalidConfig(
                "at least one shard must be configured".into(),
            ));
        }

        Ok(entries)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.postgres_virtual_nodes == 0 {
            return Err(StorageError::InvalidConfig(
                "virtual nodes must be at least 1".into(),
            ));
        }
        self.shard_entries().map(|_| ())
    }
}

impl fmt::Debug for ShardsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shards: Vec<String> = self
            .postgres_shards
            .iter()
            .map(|entry| PgConfig::mask_url(entry))
            .collect();

        f.debug_struct("ShardsConfig")
            .field("postgres_shards", &shards)
            .field("postgres_max_connections", &self.postgres_max_connections)
            .field("postgres_virtual_nodes", &self.postgres_virtual_nodes)
            .field("postgres_run_migrations", &self.postgres_run_migrations)
            .finish_non_exhaustive()
    }
}
