//! Collaborator traits the pipeline talks to, each paired with a cloneable
//! service wrapper that adds structured logging.

mod cache;
mod object;
mod response;
mod source;
mod storage;

pub use cache::{CacheProvider, CacheService};
pub use object::{ObjectProvider, ObjectService};
pub use response::{ResponseProvider, ResponseService};
pub use source::{Acknowledge, Delivery, EventSource};
pub use storage::{StorageProvider, StorageService};
