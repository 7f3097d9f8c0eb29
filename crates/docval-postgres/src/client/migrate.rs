//! Embedded migration runner.

use diesel::Connection;
use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;

use crate::{MIGRATIONS, PgClient, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Applies all pending embedded migrations to the client's database.
///
/// Migrations run on a dedicated blocking connection. Returns the versions
/// that were applied.
#[tracing::instrument(
    skip(client),
    target = TRACING_TARGET_MIGRATION,
    fields(database_url = %client.config().database_url_masked())
)]
pub async fn run_pending_migrations(client: &PgClient) -> PgResult<Vec<String>> {
    let url = client.config().database_url().to_owned();

    let applied = tokio::task::spawn_blocking(move || -> PgResult<Vec<String>> {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&url)?;
        let versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(PgError::Migration)?;
        Ok(versions.iter().map(ToString::to_string).collect())
    })
    .await
    .map_err(|e| PgError::Unexpected(format!("Migration task failed: {e}").into()))??;

    if applied.is_empty() {
        tracing::debug!(target: TRACING_TARGET_MIGRATION, "Schema is up to date");
    } else {
        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            applied = ?applied,
            "Applied pending migrations"
        );
    }

    Ok(applied)
}
