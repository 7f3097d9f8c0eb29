//! Channel-fed event source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use docval_core::provider::{Acknowledge, Delivery, EventSource};
use docval_core::{Error, Result};
use tokio::sync::mpsc;

enum Item {
    Message {
        payload: Bytes,
        routing_key: Option<String>,
        ack_fails: bool,
    },
    Failure(String),
}

#[derive(Debug, Default)]
struct Counters {
    acks: AtomicUsize,
    failed_acks: AtomicUsize,
}

/// Event source that yields what its [`ChannelSender`] pushes.
///
/// Returns `Ok(None)` once every sender is dropped and the queue drained.
pub struct ChannelSource {
    receiver: mpsc::UnboundedReceiver<Item>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for ChannelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSource").finish_non_exhaustive()
    }
}

/// Producer side of a [`ChannelSource`].
#[derive(Clone)]
pub struct ChannelSender {
    sender: mpsc::UnboundedSender<Item>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for ChannelSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSender")
            .field("acks", &self.acks())
            .finish_non_exhaustive()
    }
}

impl ChannelSource {
    /// Creates a connected source and sender.
    pub fn new() -> (Self, ChannelSender) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::<Counters>::default();
        let sender = ChannelSender {
            sender,
            counters: Arc::clone(&counters),
        };
        (Self { receiver, counters }, sender)
    }

    /// Successful acknowledgements of deliveries from this source.
    pub fn acks(&self) -> usize {
        self.counters.acks.load(Ordering::SeqCst)
    }

    /// Failed acknowledgement attempts of deliveries from this source.
    pub fn failed_acks(&self) -> usize {
        self.counters.failed_acks.load(Ordering::SeqCst)
    }
}

impl ChannelSender {
    /// Queues a message without a routing key.
    pub fn send(&self, payload: impl Into<Bytes>) {
        self.push(Item::Message {
            payload: payload.into(),
            routing_key: None,
            ack_fails: false,
        });
    }

    /// Queues a message with a routing key.
    pub fn send_with_key(&self, payload: impl Into<Bytes>, routing_key: &str) {
        self.push(Item::Message {
            payload: payload.into(),
            routing_key: Some(routing_key.to_owned()),
            ack_fails: false,
        });
    }

    /// Queues a message whose acknowledgement fails.
    pub fn send_unackable(&self, payload: impl Into<Bytes>) {
        self.push(Item::Message {
            payload: payload.into(),
            routing_key: None,
            ack_fails: true,
        });
    }

    /// Queues a fetch failure.
    pub fn fail(&self, message: &str) {
        self.push(Item::Failure(message.to_owned()));
    }

    /// Successful acknowledgements so far.
    pub fn acks(&self) -> usize {
        self.counters.acks.load(Ordering::SeqCst)
    }

    /// Failed acknowledgement attempts so far.
    pub fn failed_acks(&self) -> usize {
        self.counters.failed_acks.load(Ordering::SeqCst)
    }

    fn push(&self, item: Item) {
        // A closed receiver means the source under test already stopped.
        let _ = self.sender.send(item);
    }
}

#[async_trait::async_trait]
impl EventSource for ChannelSource {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>> {
        match self.receiver.recv().await {
            None => Ok(None),
            Some(Item::Failure(message)) => Err(Error::queue().with_message(message)),
            Some(Item::Message {
                payload,
                routing_key,
                ack_fails,
            }) => Ok(Some(Delivery::new(
                payload,
                routing_key,
                CountingAcker {
                    counters: Arc::clone(&self.counters),
                    fails: ack_fails,
                },
            ))),
        }
    }
}

struct CountingAcker {
    counters: Arc<Counters>,
    fails: bool,
}

#[async_trait::async_trait]
impl Acknowledge for CountingAcker {
    async fn ack(&self) -> Result<()> {
        if self.fails {
            self.counters.failed_acks.fetch_add(1, Ordering::SeqCst);
            return Err(Error::queue().with_message("ack rejected"));
        }
        self.counters.acks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliveries_and_acks() {
        let (mut source, sender) = ChannelSource::new();
        sender.send_with_key(&b"one"[..], "tenant-1");
        sender.send_unackable(&b"two"[..]);
        drop(sender.clone());

        let first = source.next_delivery().await.unwrap().unwrap();
        assert_eq!(first.routing_key.as_deref(), Some("tenant-1"));
        first.ack().await.unwrap();

        let second = source.next_delivery().await.unwrap().unwrap();
        assert!(second.ack().await.is_err());

        assert_eq!(sender.acks(), 1);
        assert_eq!(sender.failed_acks(), 1);

        drop(sender);
        assert!(source.next_delivery().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let (mut source, sender) = ChannelSource::new();
        sender.fail("consumer deleted");
        let error = source.next_delivery().await.unwrap_err();
        assert_eq!(error.kind(), docval_core::ErrorKind::Queue);
    }
}
