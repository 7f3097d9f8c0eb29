//! Background tasks that run alongside the worker.

mod metrics;
mod shutdown;

pub use metrics::spawn_metrics_reporter;
pub use shutdown::spawn_signal_listener;
