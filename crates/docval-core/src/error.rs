//! Structured error handling shared by every collaborator seam.

use std::borrow::Cow;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while processing an event.
///
/// The pipeline matches on this exhaustively to pick the metric category and
/// the response text for a failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The inbound message could not be decoded.
    Decode,
    /// A required input field was missing or malformed.
    InvalidInput,
    /// The document violated a structural or content rule.
    Validation,
    /// The object store request failed or returned a non-success status.
    Fetch,
    /// The object store response body could not be read.
    Read,
    /// No storage partition could be resolved for the key.
    NoShardAvailable,
    /// The storage partition rejected the write.
    StorageWrite,
    /// The cache rejected a read or write.
    Cache,
    /// The outbound response could not be published.
    Publish,
    /// The inbound queue failed to deliver or acknowledge a message.
    Queue,
    /// Configuration was invalid.
    Configuration,
    /// Internal invariant failure.
    Internal,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

/// Structured error type with classification and an optional source.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Human readable detail.
    pub message: Option<Cow<'static, str>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detail message, falling back to the source's message.
    pub fn detail(&self) -> String {
        match (&self.message, &self.source) {
            (Some(message), _) => message.to_string(),
            (None, Some(source)) => source.to_string(),
            (None, None) => self.kind.to_string(),
        }
    }

    /// Creates a decode error.
    pub fn decode() -> Self {
        Self::new(ErrorKind::Decode)
    }

    /// Creates an invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates an object fetch error.
    pub fn fetch() -> Self {
        Self::new(ErrorKind::Fetch)
    }

    /// Creates an object read error.
    pub fn read() -> Self {
        Self::new(ErrorKind::Read)
    }

    /// Creates a queue error.
    pub fn queue() -> Self {
        Self::new(ErrorKind::Queue)
    }

    /// Creates a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates an internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Decode, error)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::Unknown);
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert!(error.message.is_none());
        assert!(error.source.is_none());
    }

    #[test]
    fn test_error_display() {
        let error = Error::new(ErrorKind::StorageWrite).with_message("shard rejected insert");

        let display_str = error.to_string();
        assert_eq!(display_str, "[storage_write]: shard rejected insert");
    }

    #[test]
    fn test_detail_prefers_message() {
        let source = std::io::Error::other("connection reset");
        let error = Error::from_source(ErrorKind::Fetch, source);
        assert_eq!(error.detail(), "connection reset");

        let error = error.with_message("object_fetch_failed");
        assert_eq!(error.detail(), "object_fetch_failed");

        assert_eq!(Error::queue().detail(), "queue");
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let error = Error::from(json_error);
        assert_eq!(error.kind(), ErrorKind::Decode);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("no_shard_available").unwrap(),
            ErrorKind::NoShardAvailable
        );
        assert_eq!(ErrorKind::from_str("fetch").unwrap(), ErrorKind::Fetch);
        assert!(ErrorKind::from_str("timeout").is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(ErrorKind::default(), ErrorKind::Unknown);
    }
}
