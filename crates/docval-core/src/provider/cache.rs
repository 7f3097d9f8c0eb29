use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Key/value store with per-entry expiry.
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync {
    /// Stores `value` under `key` for at most `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Returns the value under `key`, or `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Releases any held connections.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Cache wrapper with observability.
#[derive(Clone)]
pub struct CacheService {
    inner: Arc<dyn CacheProvider>,
}

impl fmt::Debug for CacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService").finish_non_exhaustive()
    }
}

impl CacheService {
    /// Creates a new cache service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: CacheProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Creates a wrapper around an already shared provider.
    pub fn from_arc(inner: Arc<dyn CacheProvider>) -> Self {
        Self { inner }
    }

    /// Stores a value, returning the provider's error.
    pub async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }

    /// Stores a value, logging and discarding any failure.
    pub async fn set_best_effort(&self, key: &str, value: Bytes, ttl: Duration) {
        match self.inner.set(key, value, ttl).await {
            Ok(()) => tracing::trace!(
                target: TRACING_TARGET_PROVIDER,
                key,
                ttl_secs = ttl.as_secs(),
                "Cache entry written"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_PROVIDER,
                key,
                error = %error,
                "Cache write failed, continuing"
            ),
        }
    }

    /// Reads a value.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.get(key).await
    }

    /// Closes the underlying provider.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
