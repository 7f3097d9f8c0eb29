#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for collaborator seams (object fetch, cache, storage, publisher).
pub const TRACING_TARGET_PROVIDER: &str = "docval_core::provider";

/// Tracing target for metrics bookkeeping.
pub const TRACING_TARGET_METRICS: &str = "docval_core::metrics";

mod category;
mod error;
pub mod event;
mod metrics;
pub mod provider;

pub use category::FailureCategory;
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use event::{InboundEvent, OutboundResponse, ResponseStatus};
pub use metrics::{Metrics, MetricsSnapshot};
