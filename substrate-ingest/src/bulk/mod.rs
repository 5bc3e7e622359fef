//! Bulk streaming ingestor (spec §4.7): pushes millions of constants
//! through a parallel projector and the store's binary `COPY` channel.
//! `safetensor` parses SafeTensor-like tensor files; `unicode_block`
//! streams a contiguous codepoint range.
//!
//! Each submodule exposes two entry points: a generic one over any
//! [`NodeStore`](substrate_core::store::NodeStore) (used by tests and
//! small ingestions, one `get_or_insert_constant` call per row) and a
//! `*_bulk_copy` one that streams directly into a
//! [`substrate_store::PostgresStore`] via its binary `COPY` channel,
//! which is the path that actually reaches the target throughput.

pub mod progress;
pub mod safetensor;
pub mod unicode_block;

use substrate_core::hash::hash_constant;
use substrate_core::projector::project_with_hilbert;
use substrate_core::seed::Seed;
use substrate_store::copy_writer::ConstantRow;

/// Minimum number of rows batched before a flush to the store, per
/// spec §4.7's "≥ 10⁵ per batch" guidance.
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Summary returned by a bulk ingestion call.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkSummary {
    pub total: u64,
    pub stored: u64,
    /// Percentage of candidate values dropped by a sparsity threshold
    /// (always `0.0` for unicode-block ingestion).
    pub sparsity_pct: f64,
}

/// Converts a seed to an on-wire row by computing its position, Hilbert
/// index, and content hash. Pure and stateless — safe to call from any
/// worker thread, which is exactly what `rayon`'s `par_iter` does with
/// it in both bulk submodules.
#[must_use]
pub fn row_for_seed(seed: Seed) -> ConstantRow {
    let (position, (hilbert_high, hilbert_low)) = project_with_hilbert(&seed);
    ConstantRow {
        seed_value: seed.seed_value() as i64,
        seed_type: i32::from(seed.seed_type() as u8),
        content_hash: hash_constant(&seed),
        hilbert_high: hilbert_high as i64,
        hilbert_low: hilbert_low as i64,
        geom: position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_for_seed_is_deterministic() {
        let a = row_for_seed(Seed::Byte(5));
        let b = row_for_seed(Seed::Byte(5));
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.hilbert_high, b.hilbert_high);
    }
}
