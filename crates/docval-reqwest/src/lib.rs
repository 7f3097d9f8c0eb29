//! Reqwest-based object store client for docval.
//!
//! This crate provides the [`ObjectClient`], the HTTP implementation of the
//! [`ObjectProvider`] seam used by the validation worker.
//!
//! # Example
//!
//! ```rust,ignore
//! use docval_reqwest::{ObjectClient, ObjectStoreConfig};
//!
//! let config = ObjectStoreConfig::new("http://localhost:9000", "documents")
//!     .with_credentials("minio", "minio123");
//! let client = ObjectClient::new(config)?;
//! let bytes = client.get_object("inbox/report.docx").await?;
//! ```
//!
//! [`ObjectProvider`]: docval_core::provider::ObjectProvider

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod connect;
mod error;
mod service;

pub use crate::connect::{ObjectClient, ObjectStoreConfig, TRACING_TARGET};
pub use crate::error::{Error, Result};
