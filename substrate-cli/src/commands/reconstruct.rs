use std::io::{self, Write};

use substrate_core::node::NodeRef;
use substrate_core::reconstruct::{reconstruct_bytes, reconstruct_f32_bits, reconstruct_seeds, reconstruct_text};
use substrate_core::seed::Seed;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};

use crate::cli::ReconstructAs;

/// Runs `reconstruct <id> --as <kind>`, writing the original content to
/// stdout exactly (no trailing newline — callers may redirect to a
/// binary file).
pub fn run<S: NodeStore>(store: &S, id: i64, as_kind: ReconstructAs) -> Result<()> {
    let root = resolve_root(store, id)?;
    let bytes = decode(store, root, as_kind)?;

    io::stdout()
        .write_all(&bytes)
        .map_err(|e| SubstrateError::StoreIo(e.to_string()))
}

fn decode<S: NodeStore>(store: &S, root: NodeRef, as_kind: ReconstructAs) -> Result<Vec<u8>> {
    match as_kind {
        ReconstructAs::Text => Ok(reconstruct_text(store, root)?.into_bytes()),
        ReconstructAs::Bytes => reconstruct_bytes(store, root),
        ReconstructAs::Floats => {
            let bits = reconstruct_f32_bits(store, root)?;
            Ok(bits.iter().flat_map(|b| b.to_le_bytes()).collect())
        }
        ReconstructAs::Image | ReconstructAs::Audio => {
            let seeds = reconstruct_seeds(store, root)?;
            let mut out = Vec::with_capacity(seeds.len() * 8);
            for seed in seeds {
                let Seed::Integer64(v) = seed else {
                    return Err(SubstrateError::Invariant(
                        "expected INTEGER_64 seeds for image/audio reconstruction".to_string(),
                    ));
                };
                out.extend_from_slice(&v.to_le_bytes());
            }
            Ok(out)
        }
    }
}

fn resolve_root<S: NodeStore>(store: &S, id: i64) -> Result<NodeRef> {
    if store.constant_seed(id).is_ok() {
        return Ok(NodeRef::Constant(id));
    }
    if store.composition_children(id).is_ok() {
        return Ok(NodeRef::Composition(id));
    }
    Err(SubstrateError::dangling(id))
}
