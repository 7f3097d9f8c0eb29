//! In-memory storage partition.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use docval_postgres::model::{NewValidatorEvent, ValidatorEvent};
use docval_postgres::query::ValidatorEventRepository;
use docval_postgres::{PgError, PgResult, ShardRing, ShardedStorage, StorageResult};

use super::CloseLog;

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<String, Vec<u8>>,
    closed: bool,
}

/// Partition that stores rows in a map.
///
/// Rejects duplicate keys like the real table's primary key. Clones share
/// the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryPartition {
    inner: Arc<Mutex<Inner>>,
    failing: bool,
    close_log: Option<CloseLog>,
}

impl MemoryPartition {
    /// Creates an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a partition whose inserts always fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Records `close` calls in `log` as `"storage"`.
    #[must_use]
    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().rows.keys().cloned().collect()
    }

    /// Stored payload for `key`.
    pub fn payload(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().rows.get(key).cloned()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once `close` was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ValidatorEventRepository for MemoryPartition {
    async fn insert_event(&self, new_event: NewValidatorEvent<'_>) -> PgResult<()> {
        if self.failing {
            return Err(PgError::Unexpected("partition unavailable".into()));
        }

        let mut inner = self.lock();
        if inner.rows.contains_key(new_event.key) {
            return Err(PgError::Unexpected(
                format!("duplicate key value for {}", new_event.key).into(),
            ));
        }
        inner
            .rows
            .insert(new_event.key.to_owned(), new_event.payload.to_vec());
        Ok(())
    }

    async fn find_event_by_key(&self, key: &str) -> PgResult<Option<ValidatorEvent>> {
        Ok(self.payload(key).map(|payload| ValidatorEvent {
            key: key.to_owned(),
            payload,
        }))
    }

    async fn count_events(&self) -> PgResult<i64> {
        Ok(self.len() as i64)
    }

    fn close(&self) {
        self.lock().closed = true;
        if let Some(log) = &self.close_log {
            log.record("storage");
        }
    }
}

/// Builds a sharded storage over fresh memory partitions.
///
/// Returns the storage and a handle to every partition in declaration order.
pub fn memory_storage(
    virtual_nodes: u16,
    names: &[&str],
) -> StorageResult<(ShardedStorage<MemoryPartition>, Vec<MemoryPartition>)> {
    let partitions: Vec<MemoryPartition> = names.iter().map(|_| MemoryPartition::new()).collect();
    let ring = ShardRing::from_partitions(
        virtual_nodes,
        names
            .iter()
            .map(|name| name.to_string())
            .zip(partitions.iter().cloned()),
    )?;
    Ok((ShardedStorage::new(ring), partitions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_duplicates() {
        let partition = MemoryPartition::new();
        let event = NewValidatorEvent {
            key: "doc-1",
            payload: b"x",
        };
        partition.insert_event(event).await.unwrap();
        assert!(partition.insert_event(event).await.is_err());
        assert_eq!(partition.count_events().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_storage_routes_every_key_once() {
        let (storage, partitions) = memory_storage(64, &["a", "b", "c"]).unwrap();
        for index in 0..30 {
            storage
                .insert_event(&format!("doc-{index}"), b"payload")
                .await
                .unwrap();
        }

        let total: usize = partitions.iter().map(MemoryPartition::len).sum();
        assert_eq!(total, 30);

        storage.close();
        assert!(partitions.iter().all(MemoryPartition::is_closed));
    }
}
