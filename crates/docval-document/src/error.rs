//! Validation rule failures.

use docval_core::{Error, ErrorKind, FailureCategory};
use thiserror::Error;

/// Result type for validation.
pub type ValidationResult<T = ()> = std::result::Result<T, ValidationError>;

/// The first rule a document package violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("not a valid ZIP container: {0}")]
    MalformedContainer(String),

    #[error("missing required entry: {0}")]
    MissingRequiredEntry(&'static str),

    #[error("suspicious path in archive: {0}")]
    SuspiciousPath(String),

    #[error("cannot read document body: {0}")]
    UnreadableDocument(String),

    #[error("document body does not look like XML")]
    NotWellFormed,

    #[error("no text found in document")]
    NoText,

    #[error("no letters found in document")]
    NoLetters,

    #[error("document contains only {percent:.2}% {script} letters, {required}% required")]
    LowScriptRatio {
        script: &'static str,
        percent: f64,
        required: u8,
    },

    #[error("no valid dates found in document")]
    NoDatesFound,

    #[error("dates in document are {days} days apart, at most {max_days} allowed (min: {min}, max: {max})")]
    DateSpreadExceeded {
        min: String,
        max: String,
        days: i64,
        max_days: u32,
    },
}

impl ValidationError {
    /// Category recorded for this failure.
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::MalformedContainer(_) | Self::UnreadableDocument(_) | Self::NotWellFormed => {
                FailureCategory::CorruptFile
            }
            Self::MissingRequiredEntry(_) => FailureCategory::MissingParts,
            Self::SuspiciousPath(_)
            | Self::NoText
            | Self::NoLetters
            | Self::LowScriptRatio { .. }
            | Self::NoDatesFound
            | Self::DateSpreadExceeded { .. } => FailureCategory::InvalidFile,
        }
    }

    /// Stable snake_case identifier of the violated rule.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedContainer(_) => "malformed_container",
            Self::MissingRequiredEntry(_) => "missing_required_entry",
            Self::SuspiciousPath(_) => "suspicious_path",
            Self::UnreadableDocument(_) => "unreadable_document",
            Self::NotWellFormed => "not_well_formed",
            Self::NoText => "no_text",
            Self::NoLetters => "no_letters",
            Self::LowScriptRatio { .. } => "low_script_ratio",
            Self::NoDatesFound => "no_dates_found",
            Self::DateSpreadExceeded { .. } => "date_spread_exceeded",
        }
    }
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        let message = error.to_string();
        Error::from_source(ErrorKind::Validation, error).with_message(message)
    }
}
