use docval_core::{Error, ErrorKind};

use crate::PgError;

/// Result type for sharded storage operations.
pub type StorageResult<T, E = StorageError> = Result<T, E>;

/// Errors raised by the ring and the sharded storage gateway.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The ring resolved no partition for the key.
    #[error("no shard available for key {key}")]
    NoShardAvailable { key: String },

    /// The resolved partition rejected the insert.
    #[error("failed to write to shard {shard}: {source}")]
    StorageWriteFailed { shard: String, source: PgError },

    /// A partition with this name is already on the ring.
    #[error("shard {0} is already part of the ring")]
    DuplicateShard(String),

    /// The shard list could not be parsed.
    #[error("invalid shard configuration: {0}")]
    InvalidConfig(String),

    /// A partition could not be reached at startup.
    #[error("failed to connect to shard {shard}: {source}")]
    Connect { shard: String, source: PgError },

    /// Embedded migrations failed on a partition.
    #[error("failed to migrate shard {shard}: {source}")]
    Migration { shard: String, source: PgError },
}

impl StorageError {
    /// Returns true if the partition already holds a row for the key.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::StorageWriteFailed { source, .. } if source.is_unique_violation())
    }

    /// Maps this error onto the shared error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoShardAvailable { .. } => ErrorKind::NoShardAvailable,
            Self::StorageWriteFailed { .. } => ErrorKind::StorageWrite,
            Self::DuplicateShard(_) | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Connect { .. } | Self::Migration { .. } => ErrorKind::Internal,
        }
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        let kind = error.kind();
        let message = error.to_string();
        Error::from_source(kind, error).with_message(message)
    }
}
