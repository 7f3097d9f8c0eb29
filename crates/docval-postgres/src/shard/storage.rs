//! Storage gateway: ring resolution plus a single-row insert per key.

use std::sync::{PoisonError, RwLock};

use docval_core::provider::StorageProvider;

use super::{Partition, ShardRing, ShardsConfig, StorageError, StorageResult};
use crate::model::NewValidatorEvent;
use crate::query::ValidatorEventRepository;
use crate::{PgClient, TRACING_TARGET_SHARD, run_pending_migrations};

/// Routes document inserts to partitions through a [`ShardRing`].
///
/// Writes touch exactly one partition. The ring sits behind a lock so that
/// partitions can be added or removed while the gateway is shared; the lock
/// is never held across an await point.
#[derive(Debug)]
pub struct ShardedStorage<R = PgClient> {
    ring: RwLock<ShardRing<R>>,
}

impl<R> ShardedStorage<R>
where
    R: ValidatorEventRepository + Clone + Send + Sync + 'static,
{
    /// Wraps an already built ring.
    pub fn new(ring: ShardRing<R>) -> Self {
        Self {
            ring: RwLock::new(ring),
        }
    }

    /// Resolves the partition that owns `key`.
    pub fn resolve(&self, key: &str) -> Option<Partition<R>> {
        self.read_ring().resolve(key).cloned()
    }

    /// Returns the primary partition, the first one declared.
    ///
    /// This is the same partition [`ShardRing::resolve`] falls back to.
    pub fn primary(&self) -> Option<Partition<R>> {
        self.read_ring().primary().cloned()
    }

    /// Partition names in declaration order.
    pub fn shard_names(&self) -> Vec<String> {
        self.read_ring()
            .names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Adds a partition to the ring.
    pub fn add_shard(&self, name: impl Into<String>, handle: R) -> StorageResult<()> {
        let name: String = name.into();
        self.write_ring().add(name.as_str(), handle)?;
        tracing::info!(target: TRACING_TARGET_SHARD, shard = %name, "Shard joined the ring");
        Ok(())
    }

    /// Removes a partition from the ring and returns its handle.
    ///
    /// The handle is not closed; in-flight writes that already resolved to it
    /// may still complete.
    pub fn remove_shard(&self, name: &str) -> Option<R> {
        let handle = self.write_ring().remove(name);
        if handle.is_some() {
            tracing::info!(target: TRACING_TARGET_SHARD, shard = name, "Shard left the ring");
        }
        handle
    }

    /// Inserts one row for `key` on the partition that owns it.
    #[tracing::instrument(skip(self, payload), target = TRACING_TARGET_SHARD, fields(size = payload.len()))]
    pub async fn insert_event(&self, key: &str, payload: &[u8]) -> StorageResult<()> {
        let partition = self
            .resolve(key)
            .ok_or_else(|| StorageError::NoShardAvailable {
                key: key.to_owned(),
            })?;

        let new_event = NewValidatorEvent { key, payload };
        if let Err(source) = partition.handle().insert_event(new_event).await {
            let error = StorageError::StorageWriteFailed {
                shard: partition.name().to_owned(),
                source,
            };
            if error.is_duplicate_key() {
                tracing::warn!(
                    target: TRACING_TARGET_SHARD,
                    key,
                    shard = partition.name(),
                    "Key already stored"
                );
            } else {
                tracing::error!(
                    target: TRACING_TARGET_SHARD,
                    key,
                    shard = partition.name(),
                    error = %error,
                    "Insert failed"
                );
            }
            return Err(error);
        }

        tracing::debug!(
            target: TRACING_TARGET_SHARD,
            key,
            shard = partition.name(),
            "Event stored"
        );
        Ok(())
    }

    /// Closes every partition.
    pub fn close(&self) {
        let ring = self.read_ring();
        for partition in ring.partitions() {
            partition.handle().close();
        }
        tracing::info!(
            target: TRACING_TARGET_SHARD,
            shards = ring.len(),
            "Closed all shards"
        );
    }

    fn read_ring(&self) -> std::sync::RwLockReadGuard<'_, ShardRing<R>> {
        self.ring.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_ring(&self) -> std::sync::RwLockWriteGuard<'_, ShardRing<R>> {
        self.ring.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ShardedStorage<PgClient> {
    /// Connects to every configured partition and builds the ring.
    ///
    /// Each partition is verified with a connectivity check. Migrations run
    /// when the configuration asks for them.
    #[tracing::instrument(skip(config), target = TRACING_TARGET_SHARD)]
    pub async fn connect(config: &ShardsConfig) -> StorageResult<Self> {
        config.validate()?;

        let mut ring = ShardRing::new(config.postgres_virtual_nodes);
        for entry in config.shard_entries()? {
            let client = PgClient::connect(entry.config)
                .await
                .map_err(|source| StorageError::Connect {
                    shard: entry.name.clone(),
                    source,
                })?;

            if config.postgres_run_migrations {
                run_pending_migrations(&client)
                    .await
                    .map_err(|source| StorageError::Migration {
                        shard: entry.name.clone(),
                        source,
                    })?;
            }

            ring.add(entry.name, client)?;
        }

        tracing::info!(
            target: TRACING_TARGET_SHARD,
            shards = ?ring.names(),
            primary = ring.primary().map(Partition::name),
            virtual_nodes = ring.vnode_count(),
            "Shard ring ready"
        );

        Ok(Self::new(ring))
    }
}

#[async_trait::async_trait]
impl<R> StorageProvider for ShardedStorage<R>
where
    R: ValidatorEventRepository + Clone + Send + Sync + 'static,
{
    async fn insert_event(&self, key: &str, payload: &[u8]) -> docval_core::Result<()> {
        ShardedStorage::insert_event(self, key, payload)
            .await
            .map_err(Into::into)
    }

    async fn close(&self) -> docval_core::Result<()> {
        ShardedStorage::close(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use docval_core::ErrorKind;

    use super::*;
    use crate::model::ValidatorEvent;
    use crate::{PgError, PgResult};

    #[derive(Clone, Default)]
    struct FakePartition {
        rows: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        closed: Arc<Mutex<bool>>,
    }

    fn unique_violation() -> PgError {
        PgError::Query(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        ))
    }

    impl FakePartition {
        fn rows(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl ValidatorEventRepository for FakePartition {
        async fn insert_event(&self, new_event: NewValidatorEvent<'_>) -> PgResult<()> {
            if *self.closed.lock().unwrap() {
                return Err(PgError::Closed);
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(new_event.key) {
                return Err(unique_violation());
            }
            rows.insert(new_event.key.to_owned(), new_event.payload.to_vec());
            Ok(())
        }

        async fn find_event_by_key(&self, key: &str) -> PgResult<Option<ValidatorEvent>> {
            Ok(self.rows.lock().unwrap().get(key).map(|payload| ValidatorEvent {
                key: key.to_owned(),
                payload: payload.clone(),
            }))
        }

        async fn count_events(&self) -> PgResult<i64> {
            Ok(self.rows() as i64)
        }

        fn close(&self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    fn storage(names: &[&str]) -> (ShardedStorage<FakePartition>, Vec<FakePartition>) {
        let partitions: Vec<FakePartition> = names.iter().map(|_| FakePartition::default()).collect();
        let ring = ShardRing::from_partitions(
            16,
            names.iter().map(|n| n.to_string()).zip(partitions.iter().cloned()),
        )
        .unwrap();
        (ShardedStorage::new(ring), partitions)
    }

    #[tokio::test]
    async fn test_insert_lands_on_resolved_partition() {
        let (storage, partitions) = storage(&["a", "b", "c"]);

        storage.insert_event("doc-1", b"payload").await.unwrap();

        let owner = storage.resolve("doc-1").unwrap();
        let stored = owner.handle().find_event_by_key("doc-1").await.unwrap().unwrap();
        assert_eq!(stored.payload, b"payload");

        let total: usize = partitions.iter().map(FakePartition::rows).sum();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_empty_ring_has_no_shard() {
        let storage: ShardedStorage<FakePartition> = ShardedStorage::new(ShardRing::default());
        let error = storage.insert_event("doc-1", b"x").await.unwrap_err();
        assert!(matches!(error, StorageError::NoShardAvailable { ref key } if key == "doc-1"));

        let error: docval_core::Error = error.into();
        assert_eq!(error.kind(), ErrorKind::NoShardAvailable);
    }

    #[tokio::test]
    async fn test_write_failure_names_shard() {
        let (storage, _) = storage(&["only"]);
        storage.insert_event("doc-1", b"x").await.unwrap();

        let error = storage.insert_event("doc-1", b"y").await.unwrap_err();
        assert!(matches!(
            &error,
            StorageError::StorageWriteFailed { shard, .. } if shard == "only"
        ));
        assert!(error.is_duplicate_key());

        let error: docval_core::Error = error.into();
        assert_eq!(error.kind(), ErrorKind::StorageWrite);
    }

    #[tokio::test]
    async fn test_closed_partition_is_not_a_duplicate() {
        let (storage, partitions) = storage(&["only"]);
        partitions[0].close();

        let error = storage.insert_event("doc-1", b"x").await.unwrap_err();
        assert!(matches!(
            &error,
            StorageError::StorageWriteFailed { source: PgError::Closed, .. }
        ));
        assert!(!error.is_duplicate_key());
    }

    #[test]
    fn test_primary_is_first_declared() {
        let (storage, _) = storage(&["z", "a", "m"]);
        assert_eq!(storage.primary().unwrap().name(), "z");
        assert_eq!(storage.shard_names(), vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn test_add_and_remove_at_runtime() {
        let (storage, _) = storage(&["a"]);
        let extra = FakePartition::default();
        storage.add_shard("b", extra.clone()).unwrap();
        assert!(matches!(
            storage.add_shard("b", FakePartition::default()),
            Err(StorageError::DuplicateShard(_))
        ));

        for i in 0..200 {
            storage.insert_event(&format!("doc-{i}"), b"x").await.unwrap();
        }
        assert!(extra.rows() > 0);

        assert!(storage.remove_shard("b").is_some());
        assert_eq!(storage.shard_names(), vec!["a"]);
        assert!(storage.remove_shard("b").is_none());
    }

    #[tokio::test]
    async fn test_close_reaches_every_partition() {
        let (storage, partitions) = storage(&["a", "b"]);
        StorageProvider::close(&storage).await.unwrap();
        assert!(partitions.iter().all(|p| *p.closed.lock().unwrap()));
    }
}
