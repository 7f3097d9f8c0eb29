use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool, Status};
use diesel::sql_types::Integer;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::connection_hooks;
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CONNECTION,
};

/// Checkouts slower than this are logged.
const SLOW_CHECKOUT: Duration = Duration::from_millis(100);

/// Pooled connection handle for one storage partition.
///
/// Clones share the pool. Closing any clone closes the pool for all of them.
#[derive(Clone)]
pub struct PgClient {
    shared: Arc<Shared>,
}

struct Shared {
    pool: ConnectionPool,
    config: PgConfig,
}

#[derive(diesel::QueryableByName)]
struct Probe {
    #[diesel(sql_type = Integer)]
    #[allow(dead_code)]
    probe: i32,
}

impl PgClient {
    /// Builds the pool for a partition. No connection is opened yet.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CONNECTION,
        fields(partition = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        config.validate()?;

        let mut setup = ManagerConfig::default();
        setup.custom_setup = Box::new(connection_hooks::setup_callback);
        let manager = AsyncDieselConnectionManager::new_with_config(config.database_url(), setup);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_recycle(Hook::sync_fn(connection_hooks::post_recycle))
            .build()
            .map_err(|e| PgError::Unexpected(format!("cannot build partition pool: {e}").into()))?;

        Ok(Self {
            shared: Arc::new(Shared { pool, config }),
        })
    }

    /// Builds the pool and proves the partition answers a query.
    pub async fn connect(config: PgConfig) -> PgResult<Self> {
        let client = Self::new(config)?;
        client.probe().await?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            partition = %client.shared.config.database_url_masked(),
            pool_size = client.shared.config.postgres_max_connections,
            "Partition reachable"
        );
        Ok(client)
    }

    /// Runs `SELECT 1` on a pooled connection.
    pub async fn probe(&self) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        let _: Probe = diesel::sql_query("SELECT 1 AS probe")
            .get_result(&mut *conn)
            .await?;
        Ok(())
    }

    /// Checks a connection out of the pool.
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        let started_at = Instant::now();
        let result = self.shared.pool.get().await;
        let waited = started_at.elapsed();

        match result {
            Ok(conn) => {
                if waited > SLOW_CHECKOUT {
                    tracing::warn!(
                        target: TRACING_TARGET_CONNECTION,
                        waited_ms = waited.as_millis(),
                        "Slow partition checkout"
                    );
                }
                Ok(conn)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    waited_ms = waited.as_millis(),
                    error = %error,
                    "Partition checkout failed"
                );
                Err(error.into())
            }
        }
    }

    /// Current pool occupancy.
    #[inline]
    pub fn status(&self) -> Status {
        self.shared.pool.status()
    }

    #[inline]
    pub fn config(&self) -> &PgConfig {
        &self.shared.config
    }

    /// Returns true once [`close`](Self::close) was called on any clone.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shared.pool.is_closed()
    }

    /// Closes the pool. Later checkouts fail with [`PgError::Closed`].
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.shared.pool.close();
        tracing::debug!(
            target: TRACING_TARGET_CONNECTION,
            partition = %self.shared.config.database_url_masked(),
            "Partition pool closed"
        );
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        f.debug_struct("PgClient")
            .field("partition", &self.shared.config.database_url_masked())
            .field("size", &status.size)
            .field("available", &status.available)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
