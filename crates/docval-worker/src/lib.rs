#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for per-event pipeline stages.
pub const TRACING_TARGET_PIPELINE: &str = "docval_worker::pipeline";

/// Tracing target for collaborator shutdown.
pub const TRACING_TARGET_SHUTDOWN: &str = "docval_worker::shutdown";

mod error;
pub mod handler;
pub mod service;

pub use error::{Result, WorkerError};
pub use handler::{Outcome, ValidationWorker};
pub use service::{WorkerConfig, WorkerState};
