//! Concurrency-safe pipeline counters with pull-style snapshots.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};

use crate::{FailureCategory, TRACING_TARGET_METRICS};

/// Counters for received, processed and failed events.
///
/// Shared behind an `Arc` by every stage; increments never block.
#[derive(Debug, Default)]
pub struct Metrics {
    received: AtomicU64,
    processed: AtomicU64,
    errors: AtomicU64,
    categories: [AtomicU64; FailureCategory::COUNT],
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub processed: u64,
    pub errors: u64,
    pub error_categories: BTreeMap<String, u64>,
}

impl Metrics {
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event pulled from the queue.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event that was validated and persisted.
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed event under the given category.
    pub fn record_error(&self, category: FailureCategory) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.categories[category.index()].fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            target: TRACING_TARGET_METRICS,
            category = category.as_ref(),
            "error recorded"
        );
    }

    /// Takes a snapshot of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let error_categories = FailureCategory::iter()
            .map(|category| {
                let count = self.categories[category.index()].load(Ordering::Relaxed);
                (category.to_string(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            error_categories,
        }
    }
}

impl MetricsSnapshot {
    /// Returns the error count for a category.
    pub fn errors_for(&self, category: FailureCategory) -> u64 {
        self.error_categories
            .get(category.as_ref())
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = Metrics::new();
        metrics.record_received();
        metrics.record_received();
        metrics.record_processed();
        metrics.record_error(FailureCategory::CorruptFile);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 2);
        assert_eq!(snapshot.processed, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.errors_for(FailureCategory::CorruptFile), 1);
        assert_eq!(snapshot.errors_for(FailureCategory::InvalidFile), 0);
        assert_eq!(snapshot.error_categories.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments() {
        let metrics = Arc::new(Metrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(tokio::spawn(async move {
                for _ in 0..1000 {
                    metrics.record_received();
                    metrics.record_error(FailureCategory::InvalidFile);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.received, 8000);
        assert_eq!(snapshot.errors_for(FailureCategory::InvalidFile), 8000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = Metrics::new();
        metrics.record_error(FailureCategory::MissingParts);
        let json = serde_json::to_string(&metrics.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"received":0,"processed":0,"errors":1,"error_categories":{"missing_parts":1}}"#
        );
    }
}
