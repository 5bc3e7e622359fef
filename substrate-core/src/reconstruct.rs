//! Depth-first, in-order reconstruction of a node's content (§4.8).
//! Constants emit their seed; compositions expand each child
//! `multiplicity` times, recursing for composition children. An unknown
//! id or dangling relation is an [`SubstrateError::Invariant`] — a bug,
//! never a recoverable condition.

use crate::error::{Result, SubstrateError};
use crate::node::NodeRef;
use crate::seed::Seed;
use crate::store::NodeStore;

/// Walks `root`'s composition tree and returns the flat, ordered
/// sequence of seeds it expands to. Iterative (an explicit work stack)
/// so reconstruction depth is bounded only by available memory, not by
/// the native call stack.
pub fn reconstruct_seeds<S: NodeStore + ?Sized>(store: &S, root: NodeRef) -> Result<Vec<Seed>> {
    let mut out = Vec::new();
    // Each stack frame is a (node, remaining_repeats) pair to expand.
    let mut stack: Vec<(NodeRef, u32)> = vec![(root, 1)];

    // We need LIFO order to match the source order of a composition's
    // children, so we push a composition's steps in reverse.
    while let Some((node, repeats)) = stack.pop() {
        match node {
            NodeRef::Constant(id) => {
                let seed = store.constant_seed(id)?;
                for _ in 0..repeats {
                    out.push(seed);
                }
            }
            NodeRef::Composition(id) => {
                let steps = store.composition_children(id)?;
                if steps.is_empty() {
                    return Err(SubstrateError::Invariant(format!(
                        "composition {id} has no relations"
                    )));
                }
                // Expand this composition `repeats` times; within one
                // expansion, push children in reverse so popping
                // restores forward order.
                for _ in 0..repeats {
                    for step in steps.iter().rev() {
                        stack.push((step.child, step.multiplicity));
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Reconstructs a root known to be a text decomposition back into a
/// `String`. Fails with [`SubstrateError::Invariant`] if any seed along
/// the way is not a Unicode codepoint.
pub fn reconstruct_text<S: NodeStore + ?Sized>(store: &S, root: NodeRef) -> Result<String> {
    let seeds = reconstruct_seeds(store, root)?;
    let mut out = String::with_capacity(seeds.len());
    for seed in seeds {
        match seed {
            Seed::UnicodeCodepoint(cp) => {
                let c = char::from_u32(cp).ok_or_else(|| {
                    SubstrateError::Invariant(format!("U+{cp:06X} is not a valid scalar value"))
                })?;
                out.push(c);
            }
            other => {
                return Err(SubstrateError::Invariant(format!(
                    "expected UNICODE_CODEPOINT seeds, found {other:?}"
                )))
            }
        }
    }
    Ok(out)
}

/// Reconstructs a root known to be a byte ingestion back into raw bytes.
pub fn reconstruct_bytes<S: NodeStore + ?Sized>(store: &S, root: NodeRef) -> Result<Vec<u8>> {
    let seeds = reconstruct_seeds(store, root)?;
    seeds
        .into_iter()
        .map(|seed| match seed {
            Seed::Byte(b) => Ok(b),
            other => Err(SubstrateError::Invariant(format!(
                "expected BYTE seeds, found {other:?}"
            ))),
        })
        .collect()
}

/// Reconstructs a root known to be a float32 array ingestion, preserving
/// bit patterns exactly (including NaN payloads).
pub fn reconstruct_f32_bits<S: NodeStore + ?Sized>(store: &S, root: NodeRef) -> Result<Vec<u32>> {
    let seeds = reconstruct_seeds(store, root)?;
    seeds
        .into_iter()
        .map(|seed| match seed {
            Seed::Float32Bits(bits) => Ok(bits),
            other => Err(SubstrateError::Invariant(format!(
                "expected FLOAT32_BITS seeds, found {other:?}"
            ))),
        })
        .collect()
}

/// Reconstructs a root known to be a float64 array ingestion.
pub fn reconstruct_f64_bits<S: NodeStore + ?Sized>(store: &S, root: NodeRef) -> Result<Vec<u64>> {
    let seeds = reconstruct_seeds(store, root)?;
    seeds
        .into_iter()
        .map(|seed| match seed {
            Seed::Float64Bits(bits) => Ok(bits),
            other => Err(SubstrateError::Invariant(format!(
                "expected FLOAT64_BITS seeds, found {other:?}"
            ))),
        })
        .collect()
}
