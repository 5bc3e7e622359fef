//! The in-process deduplication cache: `content_hash -> node_id`,
//! bounded and LRU, consulted before every insert (§4.4). Cross-process
//! consistency is not this cache's job — the store's unique constraint
//! on `content_hash` is the source of truth; this is a hint that saves
//! a round trip on the common case.
//!
//! Bucketed locking (a fixed number of independent shards, each guarding
//! its own `LruCache`) is sufficient per §5: the operations are
//! point-lookups and inserts, not range scans.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::hash::ContentHash;
use crate::node::{NodeId, NodeRef};

const SHARD_COUNT: usize = 32;

fn shard_of(hash: &ContentHash) -> usize {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hash.as_bytes().hash(&mut hasher);
    (hasher.finish() as usize) % SHARD_COUNT
}

/// Resolves a [`ContentHash`] to the [`NodeRef`] it was last seen under.
pub struct DedupCache {
    shards: Vec<Mutex<LruCache<ContentHash, NodeRef>>>,
}

impl DedupCache {
    /// Builds a cache with `capacity` total entries, spread evenly
    /// across the internal shards.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let per_shard = (capacity / SHARD_COUNT).max(1);
        let cap = NonZeroUsize::new(per_shard).unwrap_or(NonZeroUsize::MIN);
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(LruCache::new(cap)))
            .collect();
        Self { shards }
    }

    /// Returns the cached id for `hash`, if present, marking it as
    /// recently used.
    #[must_use]
    pub fn get(&self, hash: &ContentHash) -> Option<NodeRef> {
        let shard = &self.shards[shard_of(hash)];
        shard.lock().ok()?.get(hash).copied()
    }

    /// Records that `hash` resolves to `node`.
    pub fn insert(&self, hash: ContentHash, node: NodeRef) {
        let shard = &self.shards[shard_of(&hash)];
        if let Ok(mut guard) = shard.lock() {
            guard.put(hash, node);
        }
    }

    /// Total number of entries currently cached across all shards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .filter_map(|s| s.lock().ok())
            .map(|g| g.len())
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let cache = DedupCache::with_capacity(1024);
        let hash = ContentHash::from_bytes([9; 32]);
        assert!(cache.get(&hash).is_none());
        cache.insert(hash, NodeRef::Constant(42));
        assert_eq!(cache.get(&hash), Some(NodeRef::Constant(42)));
    }

    #[test]
    fn respects_small_capacity_without_panicking() {
        let cache = DedupCache::with_capacity(4);
        for i in 0..100u8 {
            cache.insert(ContentHash::from_bytes([i; 32]), NodeRef::Constant(i64::from(i)));
        }
        assert!(cache.len() <= 4 * SHARD_COUNT);
    }
}
