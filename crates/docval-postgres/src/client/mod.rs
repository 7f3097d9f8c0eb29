//! Per-partition PostgreSQL client with connection pooling and migrations.

mod connection_hooks;
mod migrate;
mod pg_client;
mod pg_config;

use deadpool::managed::{Object, Pool};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
pub use migrate::run_pending_migrations;
pub use pg_client::PgClient;
pub use pg_config::PgConfig;

/// Type alias for the connection pool of one partition.
pub type ConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Type alias for a connection object from the pool.
pub type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;
