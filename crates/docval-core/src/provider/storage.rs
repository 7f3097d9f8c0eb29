use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Persists accepted documents.
#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
    /// Inserts a single row for `key`.
    ///
    /// Fails with [`ErrorKind::NoShardAvailable`] when no partition resolves and
    /// [`ErrorKind::StorageWrite`] when the partition rejects the write.
    ///
    /// [`ErrorKind::NoShardAvailable`]: crate::ErrorKind::NoShardAvailable
    /// [`ErrorKind::StorageWrite`]: crate::ErrorKind::StorageWrite
    async fn insert_event(&self, key: &str, payload: &[u8]) -> Result<()>;

    /// Releases partition connections.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Storage wrapper with observability.
#[derive(Clone)]
pub struct StorageService {
    inner: Arc<dyn StorageProvider>,
}

impl fmt::Debug for StorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    /// Creates a new storage service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: StorageProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Creates a wrapper around an already shared provider.
    pub fn from_arc(inner: Arc<dyn StorageProvider>) -> Self {
        Self { inner }
    }

    /// Inserts a single row for `key`.
    pub async fn insert_event(&self, key: &str, payload: &[u8]) -> Result<()> {
        let started_at = Instant::now();
        let result = self.inner.insert_event(key, payload).await;

        if let Err(error) = &result {
            tracing::warn!(
                target: TRACING_TARGET_PROVIDER,
                key,
                error = %error,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Event insert failed"
            );
        }

        result
    }

    /// Closes the underlying provider.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
