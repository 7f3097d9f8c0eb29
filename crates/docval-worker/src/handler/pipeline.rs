//! The per-event validation pipeline.
//!
//! Each delivery moves through decode, field checks, object fetch,
//! validation, cache marker, storage insert and response. Every terminal
//! branch records a metric, answers when the event carries a request id and
//! then acknowledges the delivery. Nothing is retried.

use std::time::Duration;

use bytes::Bytes;
use docval_core::provider::{Delivery, EventSource};
use docval_core::{ErrorKind, FailureCategory, InboundEvent};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;
use tracing::field::Empty;

use super::outcome::{
    MISSING_DOCUMENT_ID, MISSING_OBJECT_NAME, OBJECT_FETCH_FAILED, OBJECT_READ_FAILED, Outcome,
};
use crate::service::WorkerState;
use crate::{Result, TRACING_TARGET_PIPELINE, WorkerError};

/// Prefix of the cache key written for every validated document.
pub const VALIDATED_MARKER_PREFIX: &str = "validated:";

/// Lifetime of the validated-document marker.
pub const VALIDATED_MARKER_TTL: Duration = Duration::from_secs(5 * 60);

const MARKER_VALUE: &[u8] = b"1";

/// Sequential consumer that validates and persists inbound documents.
///
/// One worker handles one delivery at a time. Run several workers on the
/// same durable consumer to scale out.
#[derive(Debug, Clone)]
pub struct ValidationWorker {
    state: WorkerState,
    cancel_token: CancellationToken,
}

impl ValidationWorker {
    /// Creates a new validation worker.
    pub fn new(state: WorkerState, cancel_token: CancellationToken) -> Self {
        Self {
            state,
            cancel_token,
        }
    }

    /// Returns the shared worker state.
    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Spawns the worker loop over `source` as a background task.
    pub fn spawn<S>(self, mut source: S) -> JoinHandle<Result<()>>
    where
        S: EventSource + 'static,
    {
        tokio::spawn(async move { self.run(&mut source).await })
    }

    /// Consumes deliveries until cancelled or the source is exhausted.
    ///
    /// Cancellation is checked before every wait, so a cancelled worker
    /// never starts another delivery.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Source`] when the next delivery cannot be
    /// retrieved.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_PIPELINE, name = "validation_worker")]
    pub async fn run<S>(&self, source: &mut S) -> Result<()>
    where
        S: EventSource + ?Sized,
    {
        tracing::info!(target: TRACING_TARGET_PIPELINE, "Starting validation worker");

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::info!(
                        target: TRACING_TARGET_PIPELINE,
                        "Shutdown requested, stopping validation worker"
                    );
                    return Ok(());
                }

                result = source.next_delivery() => {
                    match result {
                        Ok(Some(delivery)) => {
                            self.handle_delivery(delivery).await;
                        }
                        Ok(None) => {
                            tracing::info!(
                                target: TRACING_TARGET_PIPELINE,
                                "Event source exhausted, stopping validation worker"
                            );
                            return Ok(());
                        }
                        Err(error) => {
                            tracing::error!(
                                target: TRACING_TARGET_PIPELINE,
                                error = %error,
                                "Failed to receive next delivery"
                            );
                            return Err(WorkerError::Source(error));
                        }
                    }
                }
            }
        }
    }

    /// Runs one delivery through the pipeline and acknowledges it.
    ///
    /// Publish and acknowledgement failures are logged and swallowed.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_PIPELINE,
        name = "handle_delivery",
        fields(request_id = Empty, document_id = Empty)
    )]
    pub async fn handle_delivery(&self, delivery: Delivery) -> Outcome {
        let metrics = &self.state.metrics;
        metrics.record_received();

        let (request_id, outcome) = match InboundEvent::from_slice(&delivery.payload) {
            Ok(event) => {
                let span = Span::current();
                if let Some(request_id) = event.request_id() {
                    span.record("request_id", request_id);
                }
                span.record("document_id", event.document_id.as_str());

                let outcome = self.process(&event).await;
                (event.request_id().map(str::to_owned), outcome)
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_PIPELINE,
                    error = %error,
                    payload_len = delivery.payload.len(),
                    "Failed to decode inbound event"
                );
                let outcome = Outcome::invalid(FailureCategory::InvalidFile, error.detail());
                (None, outcome)
            }
        };

        match &outcome {
            Outcome::Valid => {
                metrics.record_processed();
                tracing::info!(target: TRACING_TARGET_PIPELINE, "Document accepted");
            }
            Outcome::Invalid { category, reason } => {
                metrics.record_error(*category);
                tracing::info!(
                    target: TRACING_TARGET_PIPELINE,
                    category = category.as_ref(),
                    reason = %reason,
                    "Document rejected"
                );
            }
        }

        if let Some(request_id) = request_id.as_deref() {
            let response = outcome.response(request_id);
            self.state
                .publisher
                .publish_best_effort(delivery.routing_key.as_deref(), &response)
                .await;
        }

        if let Err(error) = delivery.ack().await {
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                error = %error,
                "Failed to acknowledge delivery"
            );
        }

        outcome
    }

    async fn process(&self, event: &InboundEvent) -> Outcome {
        if event.object_name.is_empty() {
            return Outcome::invalid(FailureCategory::InvalidFile, MISSING_OBJECT_NAME);
        }
        if event.document_id.is_empty() {
            return Outcome::invalid(FailureCategory::InvalidFile, MISSING_DOCUMENT_ID);
        }

        let data = match self.state.object.fetch(&event.object_name).await {
            Ok(data) => data,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_PIPELINE,
                    object_name = %event.object_name,
                    error = %error,
                    "Failed to fetch object"
                );
                let reason = match error.kind() {
                    ErrorKind::Read => OBJECT_READ_FAILED,
                    _ => OBJECT_FETCH_FAILED,
                };
                return Outcome::invalid(FailureCategory::CorruptFile, reason);
            }
        };

        if let Err(error) = self.state.validator.validate(&data) {
            tracing::debug!(
                target: TRACING_TARGET_PIPELINE,
                rule = error.code(),
                rule_category = error.category().as_ref(),
                "Validation failed"
            );
            return Outcome::invalid(FailureCategory::InvalidFile, error.to_string());
        }

        let marker_key = format!("{VALIDATED_MARKER_PREFIX}{}", event.document_id);
        self.state
            .cache
            .set_best_effort(
                &marker_key,
                Bytes::from_static(MARKER_VALUE),
                VALIDATED_MARKER_TTL,
            )
            .await;

        if let Err(error) = self.state.storage.insert_event(&event.document_id, &data).await {
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                kind = error.kind().as_ref(),
                error = %error,
                "Failed to persist document"
            );
            return Outcome::invalid(FailureCategory::InvalidFile, error.detail());
        }

        Outcome::Valid
    }
}
