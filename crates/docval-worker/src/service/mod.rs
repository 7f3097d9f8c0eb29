//! Worker state and configuration.
//!
//! [`WorkerState`] owns the collaborators every pipeline stage talks to:
//! the object store, the marker cache, the sharded storage and the response
//! publisher, plus the document validator and the metrics collector.

mod config;
mod state;

pub use config::{DEFAULT_METRICS_INTERVAL_SECS, WorkerConfig};
pub use state::WorkerState;
