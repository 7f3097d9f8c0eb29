//! Internal error types for docval-reqwest.

use docval_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for docval-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for docval-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The object store answered with a non-success status.
    #[error("object store returned {status} for '{object_name}'")]
    Status {
        status: StatusCode,
        object_name: String,
    },
    /// The response body could not be read.
    #[error("failed to read object body: {0}")]
    Body(#[source] reqwest::Error),
    /// The object name cannot be mapped to a request path.
    #[error("invalid object name: {0:?}")]
    InvalidObjectName(String),
    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns the pipeline error kind this error maps to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Body(_) => ErrorKind::Read,
            Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Reqwest(_) | Self::Status { .. } | Self::InvalidObjectName(_) => ErrorKind::Fetch,
        }
    }
}

impl From<Error> for docval_core::Error {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        match err {
            Error::Reqwest(e) if e.is_timeout() => docval_core::Error::new(kind)
                .with_message("object store request timed out")
                .with_source(e),
            Error::Reqwest(e) if e.is_connect() => docval_core::Error::new(kind)
                .with_message("object store connection failed")
                .with_source(e),
            other => docval_core::Error::new(kind)
                .with_message(other.to_string())
                .with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_fetch() {
        let error = Error::Status {
            status: StatusCode::NOT_FOUND,
            object_name: "a.docx".to_owned(),
        };
        assert_eq!(error.kind(), ErrorKind::Fetch);

        let core: docval_core::Error = error.into();
        assert_eq!(core.kind(), ErrorKind::Fetch);
        assert_eq!(core.detail(), "object store returned 404 Not Found for 'a.docx'");
    }

    #[test]
    fn test_invalid_name_is_fetch() {
        let core: docval_core::Error = Error::InvalidObjectName("../x".to_owned()).into();
        assert_eq!(core.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn test_config_kind() {
        assert_eq!(
            Error::InvalidConfig("empty bucket".to_owned()).kind(),
            ErrorKind::Configuration
        );
    }
}
