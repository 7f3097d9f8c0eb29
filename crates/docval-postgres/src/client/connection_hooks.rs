//! Connection setup and recycling hooks for [`diesel_async`] and [`deadpool`].

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::PgConfig;
use crate::TRACING_TARGET_CONNECTION;

/// Establishes a new connection, logging the masked address and latency.
pub fn setup_callback<C>(addr: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    let start = Instant::now();
    let masked_addr = PgConfig::mask_url(addr);

    async move {
        let result = C::establish(addr).await;
        let elapsed_ms = start.elapsed().as_millis();

        match &result {
            Ok(_) => tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                addr = %masked_addr,
                elapsed_ms,
                "Partition connection established"
            ),
            Err(err) => tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                addr = %masked_addr,
                elapsed_ms,
                error = %err,
                "Failed to establish partition connection"
            ),
        }

        result
    }
    .boxed()
}

/// Flags connections that come back from a query in a broken state.
pub fn post_recycle(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            recycle_count = metrics.recycle_count,
            "Recycled partition connection is broken"
        );
    }
    Ok(())
}
