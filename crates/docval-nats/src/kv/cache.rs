//! Marker cache backed by a NATS KV bucket.

use std::time::Duration;

use async_nats::jetstream::{self, kv};
use bytes::Bytes;
use docval_core::provider::CacheProvider;
use jiff::Timestamp;

use super::{CacheEntry, normalize_key};
use crate::stream::StreamConfig;
use crate::{Error, Result, TRACING_TARGET_KV};

/// TTL cache over a JetStream key-value bucket.
///
/// The bucket's `max_age` bounds how long entries are physically retained;
/// each entry additionally carries its own expiry so shorter TTLs are honoured
/// on read.
#[derive(Clone)]
pub struct KvCache {
    store: kv::Store,
    bucket: String,
}

impl std::fmt::Debug for KvCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvCache")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl KvCache {
    /// Get or create the bucket named in `streams`.
    #[tracing::instrument(skip(jetstream, streams), target = TRACING_TARGET_KV)]
    pub(crate) async fn new(jetstream: &jetstream::Context, streams: &StreamConfig) -> Result<Self> {
        let bucket = streams.cache_bucket.clone();

        let store = match jetstream.get_key_value(&bucket).await {
            Ok(store) => {
                tracing::debug!(
                    target: TRACING_TARGET_KV,
                    bucket = %bucket,
                    "Using existing KV bucket"
                );
                store
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_KV,
                    bucket = %bucket,
                    max_age_secs = streams.cache_max_age_secs,
                    "Creating new KV bucket"
                );
                let config = kv::Config {
                    bucket: bucket.clone(),
                    description: "Validated document markers".to_owned(),
                    max_age: streams.cache_max_age(),
                    history: 1,
                    ..Default::default()
                };
                jetstream
                    .create_key_value(config)
                    .await
                    .map_err(|e| Error::kv(&bucket, "kv_create", e.to_string()))?
            }
        };

        Ok(Self { store, bucket })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// Stores `value` under `key`, visible for at most `ttl`.
    #[tracing::instrument(skip(self, value), target = TRACING_TARGET_KV)]
    pub async fn put(&self, key: &str, value: Bytes, ttl: Duration) -> Result<u64> {
        let normalized = normalize_key(key)?;
        let entry = CacheEntry::new(value, ttl, Timestamp::now());
        let json = serde_json::to_vec(&entry)?;

        let revision = self
            .store
            .put(&normalized, json.into())
            .await
            .map_err(|e| Error::kv(&self.bucket, "kv_put", e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET_KV,
            key = %normalized,
            revision,
            expires_at = %entry.expires_at,
            "Put value to KV store"
        );
        Ok(revision)
    }

    /// Reads `key`, returning `None` when missing or expired.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_KV)]
    pub async fn fetch(&self, key: &str) -> Result<Option<Bytes>> {
        let normalized = normalize_key(key)?;

        let Some(raw) = self
            .store
            .get(&normalized)
            .await
            .map_err(|e| Error::kv(&self.bucket, "kv_get", e.to_string()))?
        else {
            tracing::debug!(
                target: TRACING_TARGET_KV,
                key = %normalized,
                "Key not found in KV store"
            );
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)
            .map_err(|e| Error::kv(&self.bucket, "kv_decode", e.to_string()))?;
        let value = entry.into_live_value(Timestamp::now());
        tracing::debug!(
            target: TRACING_TARGET_KV,
            key = %normalized,
            expired = value.is_none(),
            "Retrieved value from KV store"
        );
        Ok(value)
    }
}

#[async_trait::async_trait]
impl CacheProvider for KvCache {
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> docval_core::Result<()> {
        self.put(key, value, ttl).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> docval_core::Result<Option<Bytes>> {
        Ok(self.fetch(key).await?)
    }
}
