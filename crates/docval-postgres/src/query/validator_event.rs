//! Validator events repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewValidatorEvent, ValidatorEvent};
use crate::{PgClient, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for stored document rows on a single partition.
///
/// Rows are insert-only: there is no update or delete.
pub trait ValidatorEventRepository {
    /// Inserts one row. Fails if the key is already present.
    fn insert_event(
        &self,
        new_event: NewValidatorEvent<'_>,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Finds a row by key.
    fn find_event_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = PgResult<Option<ValidatorEvent>>> + Send;

    /// Counts the rows stored on this partition.
    fn count_events(&self) -> impl Future<Output = PgResult<i64>> + Send;

    /// Releases the partition's connections.
    fn close(&self) {}
}

impl ValidatorEventRepository for PgClient {
    async fn insert_event(&self, new_event: NewValidatorEvent<'_>) -> PgResult<()> {
        let mut conn = self.get_connection().await?;

        use schema::validator_events;

        let inserted = diesel::insert_into(validator_events::table)
            .values(&new_event)
            .execute(&mut *conn)
            .await
            .map_err(PgError::from)?;

        tracing::trace!(
            target: TRACING_TARGET_QUERY,
            key = new_event.key,
            size = new_event.payload.len(),
            inserted,
            "Inserted validator event"
        );
        Ok(())
    }

    async fn find_event_by_key(&self, key: &str) -> PgResult<Option<ValidatorEvent>> {
        let mut conn = self.get_connection().await?;

        use schema::validator_events::{self, dsl};

        validator_events::table
            .filter(dsl::key.eq(key))
            .select(ValidatorEvent::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn count_events(&self) -> PgResult<i64> {
        let mut conn = self.get_connection().await?;

        use schema::validator_events;

        validator_events::table
            .count()
            .get_result(&mut *conn)
            .await
            .map_err(PgError::from)
    }

    fn close(&self) {
        PgClient::close(self);
    }
}
