use std::fmt;
use std::sync::Arc;

use crate::{OutboundResponse, Result, TRACING_TARGET_PROVIDER};

/// Publishes outbound responses.
#[async_trait::async_trait]
pub trait ResponseProvider: Send + Sync {
    /// Publishes `response`, keyed by the inbound message's routing key.
    async fn publish(&self, routing_key: Option<&str>, response: &OutboundResponse) -> Result<()>;

    /// Flushes and releases the publisher.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Response publisher wrapper with observability.
#[derive(Clone)]
pub struct ResponseService {
    inner: Arc<dyn ResponseProvider>,
}

impl fmt::Debug for ResponseService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseService").finish_non_exhaustive()
    }
}

impl ResponseService {
    /// Creates a new response service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ResponseProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Creates a wrapper around an already shared provider.
    pub fn from_arc(inner: Arc<dyn ResponseProvider>) -> Self {
        Self { inner }
    }

    /// Publishes a response, returning the provider's error.
    pub async fn publish(
        &self,
        routing_key: Option<&str>,
        response: &OutboundResponse,
    ) -> Result<()> {
        self.inner.publish(routing_key, response).await
    }

    /// Publishes a response, logging and discarding any failure.
    pub async fn publish_best_effort(&self, routing_key: Option<&str>, response: &OutboundResponse) {
        match self.inner.publish(routing_key, response).await {
            Ok(()) => tracing::debug!(
                target: TRACING_TARGET_PROVIDER,
                request_id = %response.request_id,
                status = %response.status,
                routing_key,
                "Response published"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET_PROVIDER,
                request_id = %response.request_id,
                status = %response.status,
                routing_key,
                error = %error,
                "Response publish failed"
            ),
        }
    }

    /// Closes the underlying provider.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
