//! A deterministic, single-process [`NodeStore`] backed by `HashMap`s
//! instead of PostgreSQL. Used by every other crate's test suite so
//! tests don't need a running database; it enforces the same
//! content-hash uniqueness invariant the real store enforces via a
//! unique index.

use std::collections::HashMap;
use std::sync::Mutex;

use substrate_core::hash::{hash_composition, hash_constant, ContentHash};
use substrate_core::node::{CompositionGeometry, NodeHandle, NodeId, NodeRef};
use substrate_core::projector::project_with_hilbert;
use substrate_core::reconstruct::reconstruct_text;
use substrate_core::seed::Seed;
use substrate_core::store::{ChildRun, NodeStore, ReconstructStep};
use substrate_core::{Result, SubstrateError};

struct StoredConstant {
    seed: Seed,
}

struct StoredComposition {
    children: Vec<ReconstructStep>,
    #[allow(dead_code)]
    type_ref: Option<NodeId>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    hash_index: HashMap<ContentHash, NodeRef>,
    constants: HashMap<NodeId, StoredConstant>,
    compositions: HashMap<NodeId, StoredComposition>,
}

impl Inner {
    fn alloc_id(&mut self) -> NodeId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`NodeStore`]. Cheap to construct; one instance per test.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for InMemoryStore {
    fn get_or_insert_constant(&self, seed: Seed) -> Result<NodeHandle> {
        let content_hash = hash_constant(&seed);
        let (position, _) = project_with_hilbert(&seed);

        let mut inner = self.inner.lock().unwrap();
        if let Some(node) = inner.hash_index.get(&content_hash).copied() {
            return Ok(NodeHandle {
                node,
                content_hash,
                position,
            });
        }

        let id = inner.alloc_id();
        inner.constants.insert(id, StoredConstant { seed });
        let node = NodeRef::Constant(id);
        inner.hash_index.insert(content_hash, node);

        Ok(NodeHandle {
            node,
            content_hash,
            position,
        })
    }

    fn get_or_insert_composition(
        &self,
        children: &[ChildRun],
        type_ref: Option<NodeId>,
        geometry: CompositionGeometry,
    ) -> Result<NodeHandle> {
        let hash_runs: Vec<_> = children.iter().map(ChildRun::as_hash_run).collect();
        let content_hash = hash_composition(&hash_runs);
        let position = geometry.indexing_point();

        let mut inner = self.inner.lock().unwrap();
        if let Some(node) = inner.hash_index.get(&content_hash).copied() {
            return Ok(NodeHandle {
                node,
                content_hash,
                position,
            });
        }

        let id = inner.alloc_id();
        let steps = children
            .iter()
            .map(|run| ReconstructStep {
                child: run.child,
                multiplicity: run.multiplicity,
            })
            .collect();
        inner
            .compositions
            .insert(id, StoredComposition { children: steps, type_ref });
        let node = NodeRef::Composition(id);
        inner.hash_index.insert(content_hash, node);

        Ok(NodeHandle {
            node,
            content_hash,
            position,
        })
    }

    fn lookup_by_hash_batch(&self, hashes: &[ContentHash]) -> Result<HashMap<ContentHash, NodeId>> {
        let inner = self.inner.lock().unwrap();
        Ok(hashes
            .iter()
            .filter_map(|h| inner.hash_index.get(h).map(|n| (*h, n.id())))
            .collect())
    }

    fn constant_seed(&self, id: NodeId) -> Result<Seed> {
        let inner = self.inner.lock().unwrap();
        inner
            .constants
            .get(&id)
            .map(|c| c.seed)
            .ok_or_else(|| SubstrateError::dangling(id))
    }

    fn composition_children(&self, id: NodeId) -> Result<Vec<ReconstructStep>> {
        let inner = self.inner.lock().unwrap();
        inner
            .compositions
            .get(&id)
            .map(|c| c.children.clone())
            .ok_or_else(|| SubstrateError::dangling(id))
    }

    fn find_compositions_containing_pattern(&self, pattern: &str) -> Result<Vec<NodeId>> {
        let ids: Vec<NodeId> = {
            let inner = self.inner.lock().unwrap();
            inner.compositions.keys().copied().collect()
        };

        let mut out = Vec::new();
        for id in ids {
            if let Ok(text) = reconstruct_text(self, NodeRef::Composition(id)) {
                if text.contains(pattern) {
                    out.push(id);
                }
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    fn pattern_usage_stats(&self, top_n: usize) -> Result<Vec<(NodeId, u64)>> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<NodeId, u64> = HashMap::new();
        for composition in inner.compositions.values() {
            for step in &composition.children {
                if let NodeRef::Composition(child_id) = step.child {
                    *counts.entry(child_id).or_default() += 1;
                }
            }
        }
        let mut pairs: Vec<(NodeId, u64)> = counts.into_iter().collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(top_n);
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::hash::ChildHashRun;

    #[test]
    fn same_seed_yields_same_handle() {
        let store = InMemoryStore::new();
        let a = store.get_or_insert_constant(Seed::Byte(9)).unwrap();
        let b = store.get_or_insert_constant(Seed::Byte(9)).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn distinct_seeds_yield_distinct_ids() {
        let store = InMemoryStore::new();
        let a = store.get_or_insert_constant(Seed::Byte(1)).unwrap();
        let b = store.get_or_insert_constant(Seed::Byte(2)).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn composition_round_trips_children() {
        let store = InMemoryStore::new();
        let a = store.get_or_insert_constant(Seed::Byte(b'h')).unwrap();
        let b = store.get_or_insert_constant(Seed::Byte(b'i')).unwrap();

        let runs = [
            ChildRun {
                child: a.node,
                content_hash: a.content_hash,
                multiplicity: 1,
            },
            ChildRun {
                child: b.node,
                content_hash: b.content_hash,
                multiplicity: 1,
            },
        ];
        let geometry = CompositionGeometry::Point(substrate_core::point::Point4::centroid(&[
            a.position, b.position,
        ]));
        let handle = store.get_or_insert_composition(&runs, None, geometry).unwrap();

        let children = store.composition_children(handle.id()).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].child, a.node);
        assert_eq!(children[1].child, b.node);

        let _ = hash_composition(&runs.iter().map(ChildRun::as_hash_run).collect::<Vec<ChildHashRun>>());
    }

    #[test]
    fn dangling_id_is_an_error() {
        let store = InMemoryStore::new();
        assert!(store.constant_seed(999).is_err());
        assert!(store.composition_children(999).is_err());
    }
}
