//! Object store client module.

mod client;
mod config;

pub use client::{ObjectClient, TRACING_TARGET};
pub use config::ObjectStoreConfig;
