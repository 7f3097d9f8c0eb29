//! Consistent-hash ring of named partitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{StorageError, StorageResult};
use crate::TRACING_TARGET_SHARD;

/// Virtual nodes placed on the ring for every partition.
pub const DEFAULT_VIRTUAL_NODES: u16 = 64;

/// A named partition handle.
#[derive(Debug, Clone)]
pub struct Partition<H> {
    name: Arc<str>,
    handle: H,
}

impl<H> Partition<H> {
    /// Partition name as declared in configuration.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle used to talk to the partition.
    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Consistent-hash ring mapping keys to partitions.
///
/// Each partition owns `virtual_nodes` positions on a `u64` ring derived from
/// SHA-256 of `"{name}#{index}"`. A key belongs to the first virtual node at or
/// after SHA-256 of the key, wrapping around. Membership changes therefore
/// only move the keys adjacent to the added or removed positions.
///
/// Partitions keep their declaration order; the first one is the primary.
#[derive(Debug, Clone)]
pub struct ShardRing<H> {
    partitions: Vec<Partition<H>>,
    vnodes: BTreeMap<u64, Arc<str>>,
    virtual_nodes: u16,
}

impl<H> Default for ShardRing<H> {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES)
    }
}

impl<H> ShardRing<H> {
    /// Creates an empty ring. A `virtual_nodes` of zero is raised to one.
    pub fn new(virtual_nodes: u16) -> Self {
        Self {
            partitions: Vec::new(),
            vnodes: BTreeMap::new(),
            virtual_nodes: virtual_nodes.max(1),
        }
    }

    /// Builds a ring from partitions in declaration order.
    pub fn from_partitions<N>(
        virtual_nodes: u16,
        partitions: impl IntoIterator<Item = (N, H)>,
    ) -> StorageResult<Self>
    where
        N: Into<Arc<str>>,
    {
        let mut ring = Self::new(virtual_nodes);
        for (name, handle) in partitions {
            ring.add(name, handle)?;
        }
        Ok(ring)
    }

    /// Adds a partition after all existing ones.
    pub fn add(&mut self, name: impl Into<Arc<str>>, handle: H) -> StorageResult<()> {
        let name: Arc<str> = name.into();
        if self.get(&name).is_some() {
            return Err(StorageError::DuplicateShard(name.to_string()));
        }

        let mut placed = 0u16;
        for index in 0..self.virtual_nodes {
            let position = vnode_position(&name, index);
            // The earlier owner keeps a colliding position.
            if let std::collections::btree_map::Entry::Vacant(slot) = self.vnodes.entry(position) {
                slot.insert(Arc::clone(&name));
                placed += 1;
            }
        }

        tracing::debug!(
            target: TRACING_TARGET_SHARD,
            shard = %name,
            virtual_nodes = placed,
            "Added shard to ring"
        );

        self.partitions.push(Partition { name, handle });
        Ok(())
    }

    /// Removes a partition and returns its handle.
    pub fn remove(&mut self, name: &str) -> Option<H> {
        let index = self.partitions.iter().position(|p| p.name() == name)?;
        let partition = self.partitions.remove(index);

        for index in 0..self.virtual_nodes {
            let position = vnode_position(name, index);
            if self
                .vnodes
                .get(&position)
                .is_some_and(|owner| owner.as_ref() == name)
            {
                self.vnodes.remove(&position);
            }
        }

        tracing::debug!(target: TRACING_TARGET_SHARD, shard = name, "Removed shard from ring");
        Some(partition.handle)
    }

    /// Resolves the partition that owns `key`.
    ///
    /// Pure for an unchanged ring. Falls back to [`primary`] when no virtual
    /// node resolves, and returns `None` only when the ring has no partitions.
    ///
    /// [`primary`]: Self::primary
    pub fn resolve(&self, key: &str) -> Option<&Partition<H>> {
        let position = key_position(key);
        let owner = self
            .vnodes
            .range(position..)
            .chain(self.vnodes.range(..position))
            .next()
            .and_then(|(_, name)| self.get(name));

        owner.or_else(|| self.primary())
    }

    /// The first declared partition.
    #[inline]
    pub fn primary(&self) -> Option<&Partition<H>> {
        self.partitions.first()
    }

    /// Looks up a partition by name.
    pub fn get(&self, name: &str) -> Option<&Partition<H>> {
        self.partitions.iter().find(|p| p.name() == name)
    }

    /// Partitions in declaration order.
    #[inline]
    pub fn partitions(&self) -> &[Partition<H>] {
        &self.partitions
    }

    /// Partition names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.partitions.iter().map(Partition::name).collect()
    }

    /// Number of partitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Returns true if the ring has no partitions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Number of occupied virtual node positions.
    #[inline]
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }
}

fn vnode_position(name: &str, index: u16) -> u64 {
    ring_position(format!("{name}#{index}").as_bytes())
}

fn key_position(key: &str) -> u64 {
    ring_position(key.as_bytes())
}

/// First 8 bytes of SHA-256, big-endian.
fn ring_position(input: &[u8]) -> u64 {
    let digest = Sha256::digest(input);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(names: &[&'static str]) -> ShardRing<&'static str> {
        ShardRing::from_partitions(DEFAULT_VIRTUAL_NODES, names.iter().map(|n| (*n, *n))).unwrap()
    }

    fn keys(total: usize) -> Vec<String> {
        (0..total).map(|i| format!("document-{i}")).collect()
    }

    fn owners<'a>(ring: &'a ShardRing<&'static str>, keys: &[String]) -> Vec<&'a str> {
        keys.iter()
            .map(|k| ring.resolve(k).map(Partition::name).unwrap())
            .collect()
    }

    #[test]
    fn test_resolve_is_pure() {
        let ring = ring(&["alpha", "beta", "gamma"]);
        for key in keys(500) {
            let first = ring.resolve(&key).unwrap().name();
            let second = ring.resolve(&key).unwrap().name();
            assert_eq!(first, second);
        }

        let rebuilt = ring.clone();
        let keys = keys(500);
        assert_eq!(owners(&ring, &keys), owners(&rebuilt, &keys));
    }

    #[test]
    fn test_single_partition_owns_everything() {
        let ring = ring(&["only"]);
        assert!(keys(100).iter().all(|k| ring.resolve(k).unwrap().name() == "only"));
    }

    #[test]
    fn test_roughly_balanced() {
        let ring = ring(&["alpha", "beta", "gamma"]);
        let keys = keys(9_000);
        let owners = owners(&ring, &keys);
        for name in ["alpha", "beta", "gamma"] {
            let share = owners.iter().filter(|o| **o == name).count() as f64 / keys.len() as f64;
            assert!((0.15..=0.55).contains(&share), "{name} owns {share:.2}");
        }
    }

    #[test]
    fn test_add_only_moves_keys_to_new_partition() {
        let mut ring = ring(&["alpha", "beta", "gamma"]);
        let keys = keys(10_000);
        let before: Vec<String> = owners(&ring, &keys).into_iter().map(String::from).collect();

        ring.add("delta", "delta").unwrap();
        let after = owners(&ring, &keys);

        let mut moved = 0usize;
        for (b, a) in before.iter().zip(&after) {
            if b != a {
                assert_eq!(*a, "delta", "key moved from {b} to {a}");
                moved += 1;
            }
        }

        let ratio = moved as f64 / keys.len() as f64;
        assert!((0.1..=0.45).contains(&ratio), "moved {ratio:.2}");
    }

    #[test]
    fn test_remove_only_moves_keys_of_removed_partition() {
        let mut ring = ring(&["alpha", "beta", "gamma"]);
        let keys = keys(10_000);
        let before: Vec<String> = owners(&ring, &keys).into_iter().map(String::from).collect();

        assert_eq!(ring.remove("beta"), Some("beta"));
        let after = owners(&ring, &keys);

        for (b, a) in before.iter().zip(&after) {
            if b != "beta" {
                assert_eq!(b, a);
            } else {
                assert_ne!(*a, "beta");
            }
        }
    }

    #[test]
    fn test_primary_is_first_declared() {
        let mut ring = ring(&["gamma", "alpha", "beta"]);
        assert_eq!(ring.primary().unwrap().name(), "gamma");

        ring.remove("gamma");
        assert_eq!(ring.primary().unwrap().name(), "alpha");
        assert_eq!(ring.names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_empty_ring() {
        let mut ring: ShardRing<()> = ShardRing::default();
        assert!(ring.resolve("key").is_none());
        assert!(ring.primary().is_none());

        ring.add("solo", ()).unwrap();
        ring.remove("solo");
        assert!(ring.is_empty());
        assert_eq!(ring.vnode_count(), 0);
        assert!(ring.resolve("key").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut ring = ring(&["alpha"]);
        assert!(matches!(
            ring.add("alpha", "again"),
            Err(StorageError::DuplicateShard(name)) if name == "alpha"
        ));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.vnode_count(), usize::from(DEFAULT_VIRTUAL_NODES));
    }
}
