use substrate_core::store::NodeStore;
use substrate_core::Result;
use substrate_ingest::bulk::unicode_block::{ingest_unicode_block, BMP_RANGE, FULL_RANGE};
use substrate_ingest::bulk::DEFAULT_BATCH_SIZE;

use crate::cli::SeedKind;

/// Runs `seed <kind>`, printing the number of rows actually stored
/// (rows already present from a prior run are not recounted).
pub fn run<S: NodeStore + Sync>(store: &S, kind: &SeedKind) -> Result<()> {
    match kind {
        SeedKind::Unicode { full } => {
            let (start, end) = if *full { FULL_RANGE } else { BMP_RANGE };
            let summary = ingest_unicode_block(store, start, end, DEFAULT_BATCH_SIZE, None)?;
            println!("{}", summary.stored);
        }
    }
    Ok(())
}
