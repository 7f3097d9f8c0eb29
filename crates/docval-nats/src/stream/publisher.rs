//! Outbound response publishing.

use docval_core::OutboundResponse;
use docval_core::provider::ResponseProvider;

use super::routing::routing_headers;
use super::{StreamConfig, ensure_stream};
use crate::{NatsClient, Result, TRACING_TARGET_STREAM};

/// Publishes validation responses to the response subject.
///
/// Every publish waits for the JetStream acknowledgement before returning.
#[derive(Debug, Clone)]
pub struct ResponsePublisher {
    client: NatsClient,
    subject: String,
}

impl ResponsePublisher {
    /// Creates the response stream if missing.
    #[tracing::instrument(skip(client, streams), target = TRACING_TARGET_STREAM)]
    pub(crate) async fn new(client: NatsClient, streams: &StreamConfig) -> Result<Self> {
        ensure_stream(
            client.jetstream(),
            &streams.response_stream,
            &streams.response_subject,
            streams.stream_max_age(),
        )
        .await?;

        Ok(Self {
            client,
            subject: streams.response_subject.clone(),
        })
    }

    /// Returns the subject responses are published on.
    #[inline]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Publishes a response and waits for the server acknowledgement.
    #[tracing::instrument(skip(self, response), target = TRACING_TARGET_STREAM)]
    pub async fn publish_response(
        &self,
        routing_key: Option<&str>,
        response: &OutboundResponse,
    ) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let payload_size = payload.len();
        let headers = routing_headers(routing_key);

        let ack = self
            .client
            .jetstream()
            .publish_with_headers(self.subject.clone(), headers, payload.into())
            .await?
            .await?;

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            subject = %self.subject,
            request_id = %response.request_id,
            stream = %ack.stream,
            sequence = ack.sequence,
            payload_size,
            "Published response"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResponseProvider for ResponsePublisher {
    async fn publish(
        &self,
        routing_key: Option<&str>,
        response: &OutboundResponse,
    ) -> docval_core::Result<()> {
        Ok(self.publish_response(routing_key, response).await?)
    }

    async fn close(&self) -> docval_core::Result<()> {
        self.client.flush().await?;
        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            subject = %self.subject,
            "Response publisher flushed"
        );
        Ok(())
    }
}
