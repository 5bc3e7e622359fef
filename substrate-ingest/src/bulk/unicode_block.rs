//! Streams a contiguous Unicode codepoint range into the store (spec
//! §4.7's "Unicode block path"): skip the surrogate range, project
//! every valid codepoint in parallel, batch, stream.

use rayon::prelude::*;
use substrate_core::seed::{Seed, SURROGATE_RANGE};
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};
use substrate_store::PostgresStore;

use super::progress::{Phase, ProgressCallback, ProgressUpdate};
use super::{row_for_seed, BulkSummary, DEFAULT_BATCH_SIZE};

/// The full Basic Multilingual Plane minus surrogates.
pub const BMP_RANGE: (u32, u32) = (0, 0xFFFF);
/// Every valid Unicode scalar value minus surrogates.
pub const FULL_RANGE: (u32, u32) = (0, 0x10FFFF);

fn valid_codepoints(start_cp: u32, end_cp: u32) -> Result<Vec<u32>> {
    if start_cp > end_cp {
        return Err(SubstrateError::InvalidInput(format!(
            "start codepoint U+{start_cp:06X} is greater than end U+{end_cp:06X}"
        )));
    }
    if end_cp > substrate_core::seed::MAX_CODEPOINT {
        return Err(SubstrateError::InvalidInput(format!(
            "end codepoint U+{end_cp:06X} exceeds U+10FFFF"
        )));
    }
    Ok((start_cp..=end_cp)
        .filter(|cp| !SURROGATE_RANGE.contains(cp))
        .collect())
}

/// Ingests `[start_cp, end_cp]` against any store, one
/// `get_or_insert_constant` call per new codepoint (existing ones are
/// elided via a batched hash lookup first). Suitable for tests and
/// small ranges; large ranges against a real database should use
/// [`ingest_unicode_block_bulk_copy`] instead.
pub fn ingest_unicode_block<S: NodeStore + Sync>(
    store: &S,
    start_cp: u32,
    end_cp: u32,
    batch_size: usize,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<BulkSummary> {
    let codepoints = valid_codepoints(start_cp, end_cp)?;
    let total = codepoints.len() as u64;
    let mut stored = 0u64;
    let mut processed = 0u64;

    for chunk in codepoints.chunks(batch_size.max(1)) {
        let seeds: Vec<Seed> = chunk
            .par_iter()
            .map(|&cp| Seed::codepoint(cp).expect("surrogates already filtered"))
            .collect();
        let hashes: Vec<_> = seeds.iter().map(substrate_core::hash::hash_constant).collect();
        let existing = store.lookup_by_hash_batch(&hashes)?;

        for (seed, hash) in seeds.iter().zip(hashes.iter()) {
            if !existing.contains_key(hash) {
                store.get_or_insert_constant(*seed)?;
                stored += 1;
            }
        }
        processed += chunk.len() as u64;

        if let Some(cb) = progress.as_mut() {
            cb(ProgressUpdate {
                phase: Phase::Storing,
                processed,
                total,
                stored,
                sparsity_pct: 0.0,
            });
        }
    }

    Ok(BulkSummary {
        total,
        stored,
        sparsity_pct: 0.0,
    })
}

/// Ingests `[start_cp, end_cp]` directly into a Postgres-backed store
/// via the binary `COPY` channel: projects the whole range in parallel,
/// elides already-present hashes with one batched lookup per chunk,
/// and streams the rest.
pub fn ingest_unicode_block_bulk_copy(
    store: &PostgresStore,
    start_cp: u32,
    end_cp: u32,
    batch_size: usize,
    mut progress: Option<ProgressCallback<'_>>,
) -> Result<BulkSummary> {
    let codepoints = valid_codepoints(start_cp, end_cp)?;
    let total = codepoints.len() as u64;
    let mut stored = 0u64;
    let mut processed = 0u64;

    for chunk in codepoints.chunks(batch_size.max(1)) {
        let rows: Vec<_> = chunk
            .par_iter()
            .map(|&cp| row_for_seed(Seed::codepoint(cp).expect("surrogates already filtered")))
            .collect();

        let hashes: Vec<_> = rows.iter().map(|r| r.content_hash).collect();
        let existing = store.lookup_by_hash_batch(&hashes)?;
        let fresh: Vec<_> = rows
            .into_iter()
            .filter(|r| !existing.contains_key(&r.content_hash))
            .collect();

        if !fresh.is_empty() {
            stored += store.copy_in_constants(&fresh)?;
        }
        processed += chunk.len() as u64;

        if let Some(cb) = progress.as_mut() {
            cb(ProgressUpdate {
                phase: Phase::Storing,
                processed,
                total,
                stored,
                sparsity_pct: 0.0,
            });
        }
    }

    Ok(BulkSummary {
        total,
        stored,
        sparsity_pct: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn ingesting_bmp_twice_stores_nothing_new_the_second_time() {
        let store = InMemoryStore::new();
        let first = ingest_unicode_block(&store, 0, 0xFF, 64, None).unwrap();
        let second = ingest_unicode_block(&store, 0, 0xFF, 64, None).unwrap();
        assert_eq!(first.stored, first.total);
        assert_eq!(second.stored, 0);
    }

    #[test]
    fn surrogates_are_excluded_from_the_total() {
        let store = InMemoryStore::new();
        let summary = ingest_unicode_block(&store, 0xD700, 0xE000, 64, None).unwrap();
        assert_eq!(summary.total, (0xE000 - 0xD700 + 1) - (0xDFFF - 0xD800 + 1));
    }

    #[test]
    fn rejects_inverted_range() {
        let store = InMemoryStore::new();
        assert!(ingest_unicode_block(&store, 10, 5, 64, None).is_err());
    }
}
