//! Shared collaborators for the validation pipeline.

use std::sync::Arc;

use docval_core::provider::{CacheService, ObjectService, ResponseService, StorageService};
use docval_core::{Metrics, MetricsSnapshot};
use docval_document::DocumentValidator;
use docval_nats::{EventSubscriber, NatsClient};
use docval_postgres::ShardedStorage;
use docval_reqwest::ObjectClient;

use crate::{Result, TRACING_TARGET_SHUTDOWN, WorkerConfig, WorkerError};

/// Application state for the validation worker.
///
/// Holds every collaborator behind its service wrapper. Can be created
/// either directly with [`WorkerState::new`] or from configuration with
/// [`WorkerState::from_config`].
#[derive(Debug, Clone)]
pub struct WorkerState {
    /// Object store the document bytes are read from.
    pub object: ObjectService,
    /// Key-value cache for validated-document markers.
    pub cache: CacheService,
    /// Sharded storage for accepted documents.
    pub storage: StorageService,
    /// Outbound response publisher.
    pub publisher: ResponseService,
    /// Document rules engine.
    pub validator: Arc<DocumentValidator>,
    /// Pipeline counters.
    pub metrics: Arc<Metrics>,
}

impl WorkerState {
    /// Creates a new worker state from existing service instances.
    pub fn new(
        object: ObjectService,
        cache: CacheService,
        storage: StorageService,
        publisher: ResponseService,
        validator: DocumentValidator,
    ) -> Self {
        Self {
            object,
            cache,
            storage,
            publisher,
            validator: Arc::new(validator),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Connects every collaborator described by the configuration.
    ///
    /// Returns the state together with the inbound subscriber the pipeline
    /// should consume.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any collaborator
    /// cannot be reached.
    pub async fn from_config(config: &WorkerConfig) -> Result<(Self, EventSubscriber)> {
        config.validate()?;

        let validator = DocumentValidator::new(config.validation.clone()).map_err(|e| {
            WorkerError::configuration_with_source("Failed to build document validator", e)
        })?;

        let nats = NatsClient::connect(config.nats.clone()).await?;
        let subscriber = nats.event_subscriber(&config.streams).await?;
        let publisher = nats.response_publisher(&config.streams).await?;
        let cache = nats.kv_cache(&config.streams).await?;

        let object = ObjectClient::new(config.object_store.clone())?;
        let storage = ShardedStorage::connect(&config.shards).await?;

        let state = Self::new(
            object.into_service(),
            CacheService::new(cache),
            StorageService::new(storage),
            ResponseService::new(publisher),
            validator,
        );

        Ok((state, subscriber))
    }

    /// Returns a snapshot of the pipeline counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Releases every collaborator and logs the final counters.
    ///
    /// Collaborators close in a fixed order: object store, cache, storage,
    /// publisher. A failing close is logged and does not stop the others.
    pub async fn shutdown(&self) -> MetricsSnapshot {
        tracing::info!(target: TRACING_TARGET_SHUTDOWN, "Shutting down collaborators");

        if let Err(error) = self.object.close().await {
            log_close_failure("object", &error);
        }
        if let Err(error) = self.cache.close().await {
            log_close_failure("cache", &error);
        }
        if let Err(error) = self.storage.close().await {
            log_close_failure("storage", &error);
        }
        if let Err(error) = self.publisher.close().await {
            log_close_failure("publisher", &error);
        }

        let snapshot = self.snapshot();
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            received = snapshot.received,
            processed = snapshot.processed,
            errors = snapshot.errors,
            error_categories = ?snapshot.error_categories,
            "Final metrics"
        );
        snapshot
    }
}

fn log_close_failure(collaborator: &'static str, error: &docval_core::Error) {
    tracing::warn!(
        target: TRACING_TARGET_SHUTDOWN,
        collaborator,
        error = %error,
        "Failed to close collaborator"
    );
}

#[cfg(test)]
mod tests {
    use docval_document::ValidationConfig;
    use docval_postgres::ShardRing;
    use docval_test::{
        CloseLog, MemoryCache, MemoryPartition, MockObjectProvider, RecordingPublisher,
        memory_storage,
    };

    use super::*;

    fn validator() -> DocumentValidator {
        DocumentValidator::new(ValidationConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_closes_in_order() {
        let log = CloseLog::new();
        let partitions = vec![
            MemoryPartition::new().with_close_log(log.clone()),
            MemoryPartition::new().with_close_log(log.clone()),
        ];
        let ring = ShardRing::from_partitions(
            16,
            [("a", partitions[0].clone()), ("b", partitions[1].clone())],
        )
        .unwrap();

        let state = WorkerState::new(
            ObjectService::new(MockObjectProvider::new().with_close_log(log.clone())),
            CacheService::new(MemoryCache::new().with_close_log(log.clone())),
            StorageService::new(ShardedStorage::new(ring)),
            ResponseService::new(RecordingPublisher::new().with_close_log(log.clone())),
            validator(),
        );

        let snapshot = state.shutdown().await;
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(
            log.entries(),
            vec!["object", "cache", "storage", "storage", "publisher"]
        );
        assert!(partitions.iter().all(MemoryPartition::is_closed));
    }

    #[tokio::test]
    async fn test_shutdown_continues_after_failure() {
        let log = CloseLog::new();
        let (storage, partitions) = memory_storage(16, &["a"]).unwrap();
        let state = WorkerState::new(
            ObjectService::new(MockObjectProvider::new().with_close_log(log.clone())),
            CacheService::new(MemoryCache::failing().with_close_log(log.clone())),
            StorageService::new(storage),
            ResponseService::new(RecordingPublisher::new().with_close_log(log.clone())),
            validator(),
        );

        state.shutdown().await;
        assert_eq!(log.entries(), vec!["object", "cache", "publisher"]);
        assert!(partitions[0].is_closed());
    }

    #[tokio::test]
    async fn test_shutdown_reports_counters() {
        let (storage, _) = memory_storage(16, &["a"]).unwrap();
        let state = WorkerState::new(
            ObjectService::new(MockObjectProvider::new()),
            CacheService::new(MemoryCache::new()),
            StorageService::new(storage),
            ResponseService::new(RecordingPublisher::new()),
            validator(),
        );
        state.metrics.record_received();
        state.metrics.record_processed();

        let snapshot = state.shutdown().await;
        assert_eq!(snapshot.received, 1);
        assert_eq!(snapshot.processed, 1);
    }
}
