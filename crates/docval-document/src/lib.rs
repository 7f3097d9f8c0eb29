#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for validation outcomes.
pub const TRACING_TARGET: &str = "docval_document::validator";

mod config;
mod dates;
mod error;
mod script;
mod text;
mod validator;

pub use config::{TargetScript, ValidationConfig};
pub use dates::DateScanner;
pub use error::{ValidationError, ValidationResult};
pub use script::ScriptRatio;
pub use text::TextExtractor;
pub use validator::{DOCUMENT_ENTRY, DocumentValidator, MAX_DOCUMENT_BYTES, REQUIRED_ENTRIES};
