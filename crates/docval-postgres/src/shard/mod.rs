//! Consistent-hash partitioning of the document store.

mod config;
mod error;
mod ring;
mod storage;

pub use config::{ShardEntry, ShardsConfig};
pub use error::{StorageError, StorageResult};
pub use ring::{DEFAULT_VIRTUAL_NODES, Partition, ShardRing};
pub use storage::ShardedStorage;
