//! In-memory TTL cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use bytes::Bytes;
use docval_core::provider::CacheProvider;
use docval_core::{Error, ErrorKind, Result};

use super::CloseLog;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, (Bytes, Instant)>,
    writes: Vec<(String, Bytes, Duration)>,
}

/// Cache that keeps entries in a map and records every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<Inner>>,
    failing: bool,
    close_log: Option<CloseLog>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose writes and close always fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Records `close` calls in `log` as `"cache"`.
    #[must_use]
    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    /// Every accepted write as `(key, value, ttl)`, in order.
    pub fn writes(&self) -> Vec<(String, Bytes, Duration)> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl CacheProvider for MemoryCache {
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        if self.failing {
            return Err(Error::new(ErrorKind::Cache).with_message("cache unavailable"));
        }

        let mut inner = self.lock();
        inner.writes.push((key.to_owned(), value.clone(), ttl));
        inner
            .entries
            .insert(key.to_owned(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let inner = self.lock();
        Ok(inner
            .entries
            .get(key)
            .filter(|(_, deadline)| Instant::now() < *deadline)
            .map(|(value, _)| value.clone()))
    }

    async fn close(&self) -> Result<()> {
        if let Some(log) = &self.close_log {
            log.record("cache");
        }
        if self.failing {
            return Err(Error::new(ErrorKind::Cache).with_message("cache unavailable"));
        }
        Ok(())
    }
}
