//! Error types and utilities for NATS operations.

use std::time::Duration;

use docval_core::ErrorKind;

/// Result type for all NATS operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for NATS operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// NATS client/connection errors
    #[error("NATS connection error: {0}")]
    Connection(#[from] async_nats::Error),

    /// Serialization errors when sending or receiving messages
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JetStream publish error
    #[error("JetStream publish error: {0}")]
    JetstreamPublish(#[from] async_nats::jetstream::context::PublishError),

    /// Operation timeout
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Stream operation failed
    #[error("Stream operation failed on '{stream}': {error}")]
    StreamError { stream: String, error: String },

    /// Consumer operation failed
    #[error("Consumer '{consumer}' error: {reason}")]
    ConsumerError { consumer: String, reason: String },

    /// Acknowledgement error
    #[error("Acknowledgement error: {0}")]
    Ack(String),

    /// KV bucket operation failed
    #[error("KV operation '{operation}' failed on '{bucket}': {reason}")]
    Kv {
        bucket: String,
        operation: &'static str,
        reason: String,
    },

    /// Key cannot be stored in a KV bucket
    #[error("Invalid KV key: {0:?}")]
    InvalidKey(String),

    /// Invalid configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create a stream error
    pub fn stream_error(stream: impl Into<String>, error: impl Into<String>) -> Self {
        Self::StreamError {
            stream: stream.into(),
            error: error.into(),
        }
    }

    /// Create a consumer error
    pub fn consumer_error(consumer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConsumerError {
            consumer: consumer.into(),
            reason: reason.into(),
        }
    }

    /// Create a KV error
    pub fn kv(bucket: impl Into<String>, operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Kv {
            bucket: bucket.into(),
            operation,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns the pipeline error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_)
            | Self::Timeout { .. }
            | Self::StreamError { .. }
            | Self::ConsumerError { .. }
            | Self::Ack(_) => ErrorKind::Queue,
            Self::JetstreamPublish(_) => ErrorKind::Publish,
            Self::Serialization(_) => ErrorKind::Decode,
            Self::Kv { .. } | Self::InvalidKey(_) => ErrorKind::Cache,
            Self::InvalidConfig { .. } => ErrorKind::Configuration,
        }
    }
}

impl From<Error> for docval_core::Error {
    fn from(error: Error) -> Self {
        docval_core::Error::from_source(error.kind(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::Ack("closed".into()).kind(), ErrorKind::Queue);
        assert_eq!(
            Error::kv("validated_documents", "kv_put", "timeout").kind(),
            ErrorKind::Cache
        );
        assert_eq!(
            Error::invalid_config("empty url").kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_into_core_error() {
        let error: docval_core::Error = Error::consumer_error("docval", "gone").into();
        assert_eq!(error.kind(), ErrorKind::Queue);
        assert_eq!(error.detail(), "Consumer 'docval' error: gone");
    }
}
