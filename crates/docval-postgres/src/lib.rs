#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Embeds all migrations into the final binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!("./migrations");

// Tracing target constants for consistent logging.

/// Tracing target for query execution.
pub const TRACING_TARGET_QUERY: &str = "docval_postgres::queries";

/// Tracing target for migration runs.
pub const TRACING_TARGET_MIGRATION: &str = "docval_postgres::migrations";

/// Tracing target for connection establishment and pool management.
pub const TRACING_TARGET_CONNECTION: &str = "docval_postgres::connection";

/// Tracing target for ring membership and key resolution.
pub const TRACING_TARGET_SHARD: &str = "docval_postgres::shard";

mod client;
pub mod model;
pub mod query;
mod schema;
pub mod shard;

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::{DatabaseErrorKind, Error};
use diesel_async::pooled_connection::PoolError as DieselPoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;

pub use crate::client::{
    ConnectionPool, PgClient, PgConfig, PooledConnection, run_pending_migrations,
};
pub use crate::shard::{
    DEFAULT_VIRTUAL_NODES, Partition, ShardEntry, ShardRing, ShardedStorage, ShardsConfig,
    StorageError, StorageResult,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all PostgreSQL operations on a single partition.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Invalid configuration parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Waiting for, creating or recycling a connection timed out.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Applying embedded migrations failed.
    #[error("Database migration error: {0}")]
    Migration(BoxError),

    /// Query execution failed, including constraint violations.
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// The pool was closed.
    #[error("Connection pool is closed")]
    Closed,

    /// Unexpected error occurred.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Returns true if the error is a unique or primary key violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            PgError::Query(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }
}

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!(target: TRACING_TARGET_CONNECTION, error = %err, "Unexpected post-create hook error");
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!(target: TRACING_TARGET_CONNECTION, "No tokio runtime specified for connection pool");
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => Self::Closed,
        }
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation() {
        let error = PgError::Query(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        ));
        assert!(error.is_unique_violation());
        assert!(!PgError::Closed.is_unique_violation());
        assert!(!PgError::Timeout(TimeoutType::Wait).is_unique_violation());
    }

    #[test]
    fn test_closed_pool_maps_to_closed() {
        assert!(matches!(PgError::from(DeadpoolError::Closed), PgError::Closed));
    }
}
