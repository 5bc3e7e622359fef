//! Memory-mapped file loading shared by every CLI-facing ingestion
//! entry point: the input is mapped into a bounded working set rather
//! than read wholesale into a heap buffer. `Mmap` derefs to `&[u8]`,
//! so it drops straight into every pipeline's existing `&[u8]` input.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use substrate_core::{Result, SubstrateError};

/// Memory-maps `path` read-only.
///
/// # Safety
///
/// The mapping is only sound while nothing else truncates or mutates
/// the underlying file for as long as it's held; a single short-lived
/// CLI invocation reading an input file does not do that.
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)
        .map_err(|e| SubstrateError::InvalidInput(format!("cannot open {}: {e}", path.display())))?;
    unsafe { Mmap::map(&file) }
        .map_err(|e| SubstrateError::InvalidInput(format!("cannot map {}: {e}", path.display())))
}
