use std::fmt;

use bytes::Bytes;

use crate::Result;

/// Acknowledges a single delivered message.
#[async_trait::async_trait]
pub trait Acknowledge: Send + Sync {
    /// Marks the message as consumed so the queue does not redeliver it.
    async fn ack(&self) -> Result<()>;
}

/// A message pulled from the inbound queue.
pub struct Delivery {
    /// Raw message body.
    pub payload: Bytes,
    /// Routing key responses are published under.
    pub routing_key: Option<String>,
    acker: Box<dyn Acknowledge>,
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("payload_len", &self.payload.len())
            .field("routing_key", &self.routing_key)
            .finish_non_exhaustive()
    }
}

impl Delivery {
    /// Creates a delivery with its acknowledgement handle.
    pub fn new(
        payload: impl Into<Bytes>,
        routing_key: Option<String>,
        acker: impl Acknowledge + 'static,
    ) -> Self {
        Self {
            payload: payload.into(),
            routing_key,
            acker: Box::new(acker),
        }
    }

    /// Acknowledges the message.
    pub async fn ack(&self) -> Result<()> {
        self.acker.ack().await
    }
}

/// Pull-based source of inbound deliveries.
///
/// Returns `Ok(None)` once the source is exhausted. Any error is fatal to the
/// consuming pipeline.
#[async_trait::async_trait]
pub trait EventSource: Send {
    /// Waits for the next delivery.
    async fn next_delivery(&mut self) -> Result<Option<Delivery>>;
}
