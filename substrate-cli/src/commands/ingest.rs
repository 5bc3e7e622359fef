use substrate_core::seed::Seed;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};
use substrate_ingest::bulk::safetensor::{ingest_safetensor, SparsityConfig};
use substrate_ingest::decompose;
use substrate_ingest::mmap_file;
use substrate_ingest::pipelines::bytes::ingest_bytes;

use crate::cli::IngestKind;

/// Runs `ingest <kind>`, printing the resulting root node id. Every file
/// is memory-mapped rather than read into a heap buffer.
pub fn run<S: NodeStore + Sync>(store: &S, kind: &IngestKind) -> Result<()> {
    match kind {
        IngestKind::Text { file } => {
            let data = mmap_file(file)?;
            let text = std::str::from_utf8(&data)
                .map_err(|e| SubstrateError::InvalidInput(format!("{}: not valid UTF-8: {e}", file.display())))?;
            let seeds: Vec<Seed> = text
                .chars()
                .map(|c| Seed::codepoint(c as u32))
                .collect::<Result<_>>()?;
            let handle = decompose(store, &seeds)?;
            println!("{}", handle.id());
        }
        IngestKind::Bytes { file } => {
            let data = mmap_file(file)?;
            let handle = ingest_bytes(store, &data)?;
            println!("{}", handle.id());
        }
        IngestKind::Safetensor {
            file,
            sparsity_pct,
            sparsity_threshold,
        } => {
            let data = mmap_file(file)?;
            let sparsity = SparsityConfig {
                threshold: *sparsity_threshold,
                target_percentile: *sparsity_pct,
            };
            let summary = ingest_safetensor(store, &data, sparsity, None)?;
            println!(
                "total={} stored={} sparsity_pct={:.2}",
                summary.total, summary.stored, summary.sparsity_pct
            );
        }
    }
    Ok(())
}
