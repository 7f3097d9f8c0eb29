//! Key-value cache for validation markers.

mod cache;
mod cache_entry;
mod kv_key;

pub use cache::KvCache;
pub use cache_entry::CacheEntry;
pub use kv_key::normalize_key;
