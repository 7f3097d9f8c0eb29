//! Worker error types.

use std::borrow::Cow;

use docval_core::ErrorKind;

/// Result type alias for worker operations.
pub type Result<T, E = WorkerError> = std::result::Result<T, E>;

/// Worker error type.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The event source failed; the pipeline cannot continue.
    #[error("event source failed: {0}")]
    Source(#[source] docval_core::Error),

    /// NATS setup failed.
    #[error("messaging error: {0}")]
    Messaging(#[from] docval_nats::Error),

    /// Storage setup failed.
    #[error("storage error: {0}")]
    Storage(#[from] docval_postgres::StorageError),

    /// Object store client setup failed.
    #[error("object store error: {0}")]
    ObjectStore(#[from] docval_reqwest::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Configuration {
        message: Cow<'static, str>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl WorkerError {
    /// Creates a configuration error with a message.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error with a message and source.
    pub fn configuration_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the pipeline error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source(error) => error.kind(),
            Self::Messaging(error) => error.kind(),
            Self::Storage(error) => error.kind(),
            Self::ObjectStore(error) => error.kind(),
            Self::Configuration { .. } => ErrorKind::Configuration,
        }
    }
}

impl From<WorkerError> for docval_core::Error {
    fn from(error: WorkerError) -> Self {
        match error {
            WorkerError::Source(error) => error,
            other => docval_core::Error::from_source(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_keeps_kind() {
        let error = WorkerError::Source(docval_core::Error::queue().with_message("gone"));
        assert_eq!(error.kind(), ErrorKind::Queue);

        let core: docval_core::Error = error.into();
        assert_eq!(core.detail(), "gone");
    }

    #[test]
    fn test_configuration_kind() {
        let error = WorkerError::configuration("marker ttl must be positive");
        assert_eq!(error.kind(), ErrorKind::Configuration);
        assert_eq!(
            error.to_string(),
            "invalid configuration: marker ttl must be positive"
        );
    }
}
