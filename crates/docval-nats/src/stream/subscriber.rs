//! Durable pull subscription for inbound validation requests.

use async_nats::jetstream::{self, AckKind, consumer};
use docval_core::provider::{Acknowledge, Delivery, EventSource};
use futures::StreamExt;

use super::{StreamConfig, ensure_stream, routing_key};
use crate::{Error, Result, TRACING_TARGET_STREAM};

/// Pulls inbound events from a durable JetStream consumer.
///
/// Messages require an explicit acknowledgement, which the pipeline sends
/// once per message after its single processing attempt.
pub struct EventSubscriber {
    messages: consumer::pull::Stream,
    stream_name: String,
    consumer_name: String,
}

impl std::fmt::Debug for EventSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscriber")
            .field("stream_name", &self.stream_name)
            .field("consumer_name", &self.consumer_name)
            .finish_non_exhaustive()
    }
}

impl EventSubscriber {
    /// Creates the stream and durable consumer if missing and starts pulling.
    #[tracing::instrument(skip(jetstream, streams), target = TRACING_TARGET_STREAM)]
    pub(crate) async fn new(jetstream: &jetstream::Context, streams: &StreamConfig) -> Result<Self> {
        let stream = ensure_stream(
            jetstream,
            &streams.inbound_stream,
            &streams.inbound_subject,
            streams.stream_max_age(),
        )
        .await?;

        let consumer_config = consumer::pull::Config {
            name: Some(streams.consumer_name.clone()),
            durable_name: Some(streams.consumer_name.clone()),
            description: Some(format!("docval consumer for {}", streams.inbound_subject)),
            ack_policy: consumer::AckPolicy::Explicit,
            filter_subject: streams.inbound_subject.clone(),
            ..Default::default()
        };

        let consumer = stream
            .get_or_create_consumer(&streams.consumer_name, consumer_config)
            .await
            .map_err(|e| Error::consumer_error(&streams.consumer_name, e.to_string()))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| Error::consumer_error(&streams.consumer_name, e.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET_STREAM,
            stream = %streams.inbound_stream,
            consumer = %streams.consumer_name,
            subject = %streams.inbound_subject,
            "Subscribed to inbound events"
        );

        Ok(Self {
            messages,
            stream_name: streams.inbound_stream.clone(),
            consumer_name: streams.consumer_name.clone(),
        })
    }

    /// Returns the stream name.
    #[inline]
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Returns the consumer name.
    #[inline]
    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Waits for the next message, or `None` once the consumer stream ends.
    pub async fn next_message(&mut self) -> Result<Option<Delivery>> {
        let Some(next) = self.messages.next().await else {
            tracing::info!(
                target: TRACING_TARGET_STREAM,
                consumer = %self.consumer_name,
                "Consumer stream ended"
            );
            return Ok(None);
        };

        let message = next.map_err(|e| Error::consumer_error(&self.consumer_name, e.to_string()))?;
        let (message, acker) = message.split();
        let routing_key = routing_key(message.headers.as_ref(), message.subject.as_str());

        tracing::trace!(
            target: TRACING_TARGET_STREAM,
            consumer = %self.consumer_name,
            routing_key = %routing_key,
            payload_size = message.payload.len(),
            "Received message"
        );

        Ok(Some(Delivery::new(
            message.payload,
            Some(routing_key),
            JetStreamAcker(acker),
        )))
    }
}

#[async_trait::async_trait]
impl EventSource for EventSubscriber {
    async fn next_delivery(&mut self) -> docval_core::Result<Option<Delivery>> {
        Ok(self.next_message().await?)
    }
}

/// Acknowledges a JetStream message after it was split from its payload.
struct JetStreamAcker(jetstream::message::Acker);

#[async_trait::async_trait]
impl Acknowledge for JetStreamAcker {
    async fn ack(&self) -> docval_core::Result<()> {
        self.0
            .ack_with(AckKind::Ack)
            .await
            .map_err(|e| Error::Ack(e.to_string()).into())
    }
}
