#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for NATS client operations.
///
/// Use this target for logging client initialization, configuration, and client-level errors.
pub const TRACING_TARGET_CLIENT: &str = "docval_nats::client";

/// Tracing target for NATS key-value store operations.
pub const TRACING_TARGET_KV: &str = "docval_nats::kv";

/// Tracing target for NATS JetStream operations.
///
/// Use this target for logging stream operations, consumer operations, and JetStream-related errors.
pub const TRACING_TARGET_STREAM: &str = "docval_nats::stream";

/// Tracing target for NATS connection operations.
pub const TRACING_TARGET_CONNECTION: &str = "docval_nats::connection";

mod client;
mod error;
pub mod kv;
pub mod stream;

// Re-export async_nats types needed by consumers
pub use async_nats::jetstream;
pub use client::{NatsClient, NatsConfig};
pub use error::{Error, Result};
pub use kv::{CacheEntry, KvCache, normalize_key};
pub use stream::{
    EventSubscriber, ROUTING_KEY_HEADER, ResponsePublisher, StreamConfig, routing_key,
};
