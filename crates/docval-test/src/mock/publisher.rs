//! Response publisher that records what it is asked to send.

use std::sync::{Arc, Mutex, PoisonError};

use docval_core::provider::ResponseProvider;
use docval_core::{Error, ErrorKind, OutboundResponse, Result};

use super::CloseLog;

/// Publisher that keeps every response with its routing key.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<(Option<String>, OutboundResponse)>>>,
    failing: bool,
    close_log: Option<CloseLog>,
}

impl RecordingPublisher {
    /// Creates a publisher with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher whose publishes always fail. Attempts are still recorded.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Records `close` calls in `log` as `"publisher"`.
    #[must_use]
    pub fn with_close_log(mut self, log: CloseLog) -> Self {
        self.close_log = Some(log);
        self
    }

    /// Every publish attempt as `(routing_key, response)`, in order.
    pub fn published(&self) -> Vec<(Option<String>, OutboundResponse)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Responses only, in order.
    pub fn responses(&self) -> Vec<OutboundResponse> {
        self.published()
            .into_iter()
            .map(|(_, response)| response)
            .collect()
    }
}

#[async_trait::async_trait]
impl ResponseProvider for RecordingPublisher {
    async fn publish(&self, routing_key: Option<&str>, response: &OutboundResponse) -> Result<()> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((routing_key.map(str::to_owned), response.clone()));

        if self.failing {
            return Err(Error::new(ErrorKind::Publish).with_message("publisher unavailable"));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(log) = &self.close_log {
            log.record("publisher");
        }
        Ok(())
    }
}
