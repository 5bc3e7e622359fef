//! The persistence boundary (§4.3). `substrate-store` provides the
//! PostgreSQL-backed implementation; `substrate-test-support` provides a
//! deterministic in-memory one for tests, per the Design Note that
//! replaces an in-memory test database with an explicit trait
//! implementation rather than a DI container.

use std::collections::HashMap;

use crate::error::Result;
use crate::hash::{ChildHashRun, ContentHash};
use crate::node::{CompositionGeometry, NodeHandle, NodeId, NodeRef};
use crate::seed::Seed;

/// One RLE run of a composition's children, as handed to
/// [`NodeStore::get_or_insert_composition`]. Children already have ids
/// and hashes — they were produced by an earlier call into this trait.
#[derive(Debug, Clone, Copy)]
pub struct ChildRun {
    pub child: NodeRef,
    pub content_hash: ContentHash,
    pub multiplicity: u32,
}

impl ChildRun {
    #[must_use]
    pub fn as_hash_run(&self) -> ChildHashRun {
        ChildHashRun {
            content_hash: self.content_hash,
            multiplicity: self.multiplicity,
        }
    }
}

/// One step of a reconstructed node: a child expanded `multiplicity`
/// times, in `position_index` order.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructStep {
    pub child: NodeRef,
    pub multiplicity: u32,
}

/// The store's public contract. Every method is synchronous: store
/// interactions may block on I/O, but the ingestor's own concurrency
/// model is cooperative (workers produce, a single task consumes), so
/// the trait does not need `async fn` to support the worker-pool /
/// single-writer-stream split described in §5.
pub trait NodeStore {
    /// Computes the seed's hash, consults the cache, and on miss
    /// computes the position + Hilbert index and inserts a new row.
    /// `content_hash` uniqueness is authoritative: a concurrent insert
    /// racing on the same hash returns the same id.
    fn get_or_insert_constant(&self, seed: Seed) -> Result<NodeHandle>;

    /// Computes the composition's hash from its already-addressed
    /// children, consults the cache, and on miss inserts the
    /// composition row plus one relation per RLE run, all in a single
    /// transaction.
    fn get_or_insert_composition(
        &self,
        children: &[ChildRun],
        type_ref: Option<NodeId>,
        geometry: CompositionGeometry,
    ) -> Result<NodeHandle>;

    /// Batched existence check used by the bulk ingestor to elide rows
    /// already present before streaming a batch.
    fn lookup_by_hash_batch(
        &self,
        hashes: &[ContentHash],
    ) -> Result<HashMap<ContentHash, NodeId>>;

    /// Looks up a single node by its content hash, for the `lookup`
    /// CLI command.
    fn lookup_by_hash(&self, hash: ContentHash) -> Result<Option<NodeId>> {
        Ok(self.lookup_by_hash_batch(&[hash])?.remove(&hash))
    }

    /// Recovers a constant's seed by id. Used by the reconstructor's
    /// leaf case.
    fn constant_seed(&self, id: NodeId) -> Result<Seed>;

    /// Recovers a composition's ordered, RLE-compressed children. Used
    /// by the reconstructor's recursive case.
    fn composition_children(&self, id: NodeId) -> Result<Vec<ReconstructStep>>;

    /// Returns ids of compositions whose reconstructed content contains
    /// `pattern` as a contiguous codepoint substring (§4.6 query
    /// surface). Implemented as a store-side index lookup, not a
    /// reimplementation of string search.
    fn find_compositions_containing_pattern(&self, pattern: &str) -> Result<Vec<NodeId>>;

    /// Returns the `top_n` most-referenced compositions by relation
    /// fan-in, `(id, reference_count)` pairs in descending order.
    fn pattern_usage_stats(&self, top_n: usize) -> Result<Vec<(NodeId, u64)>>;
}
