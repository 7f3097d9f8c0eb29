use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use crate::{Result, TRACING_TARGET_PROVIDER};

/// Fetches raw object bytes from the external object store.
#[async_trait::async_trait]
pub trait ObjectProvider: Send + Sync {
    /// Returns the full body of the named object.
    ///
    /// A non-success status or transport failure is an [`ErrorKind::Fetch`]
    /// error; a failure while reading the body is an [`ErrorKind::Read`] error.
    ///
    /// [`ErrorKind::Fetch`]: crate::ErrorKind::Fetch
    /// [`ErrorKind::Read`]: crate::ErrorKind::Read
    async fn fetch(&self, object_name: &str) -> Result<Bytes>;

    /// Releases any held connections.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Object store wrapper with observability.
#[derive(Clone)]
pub struct ObjectService {
    inner: Arc<dyn ObjectProvider>,
}

impl fmt::Debug for ObjectService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectService").finish_non_exhaustive()
    }
}

impl ObjectService {
    /// Creates a new object service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ObjectProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Creates a wrapper around an already shared provider.
    pub fn from_arc(inner: Arc<dyn ObjectProvider>) -> Self {
        Self { inner }
    }

    /// Fetches the named object.
    pub async fn fetch(&self, object_name: &str) -> Result<Bytes> {
        let started_at = Instant::now();
        let result = self.inner.fetch(object_name).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(bytes) => tracing::debug!(
                target: TRACING_TARGET_PROVIDER,
                object_name,
                size = bytes.len(),
                elapsed_ms = elapsed.as_millis(),
                "Object fetched"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET_PROVIDER,
                object_name,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Object fetch failed"
            ),
        }

        result
    }

    /// Closes the underlying provider.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
