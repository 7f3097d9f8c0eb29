//! In-memory stand-ins for the worker's collaborators.

mod cache;
mod object;
mod partition;
mod publisher;
mod source;

use std::sync::{Arc, Mutex, PoisonError};

pub use cache::MemoryCache;
pub use object::{MockObject, MockObjectProvider};
pub use partition::{MemoryPartition, memory_storage};
pub use publisher::RecordingPublisher;
pub use source::{ChannelSender, ChannelSource};

/// Shared record of collaborator close calls, in call order.
#[derive(Debug, Clone, Default)]
pub struct CloseLog {
    entries: Arc<Mutex<Vec<&'static str>>>,
}

impl CloseLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a label.
    pub fn record(&self, label: &'static str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label);
    }

    /// Returns the labels recorded so far.
    pub fn entries(&self) -> Vec<&'static str> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
