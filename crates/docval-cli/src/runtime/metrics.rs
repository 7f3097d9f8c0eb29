//! Periodic metrics snapshots in the log.

use std::sync::Arc;
use std::time::Duration;

use docval_core::Metrics;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_METRICS;

/// Logs a snapshot of `metrics` every `interval` until cancelled.
pub fn spawn_metrics_reporter(
    metrics: Arc<Metrics>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => break,
                _ = ticker.tick() => log_snapshot(&metrics),
            }
        }
    })
}

fn log_snapshot(metrics: &Metrics) {
    let snapshot = metrics.snapshot();
    tracing::info!(
        target: TRACING_TARGET_METRICS,
        received = snapshot.received,
        processed = snapshot.processed,
        errors = snapshot.errors,
        error_categories = ?snapshot.error_categories,
        "Metrics snapshot"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reporter_stops_on_cancel() {
        let metrics = Arc::new(Metrics::new());
        let cancel_token = CancellationToken::new();
        let handle = spawn_metrics_reporter(
            Arc::clone(&metrics),
            Duration::from_secs(60),
            cancel_token.clone(),
        );

        metrics.record_received();
        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel_token.cancel();

        handle.await.unwrap();
    }
}
