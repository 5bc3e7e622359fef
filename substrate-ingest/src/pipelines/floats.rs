//! Float array ingestion: each value becomes a `FLOAT32_BITS` or
//! `FLOAT64_BITS` constant carrying the IEEE-754 bit pattern verbatim
//! (so NaN payloads and signed zero survive round-trip exactly),
//! composed in order with RLE over adjacent equal bit patterns.

use substrate_core::node::NodeHandle;
use substrate_core::seed::Seed;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};

use super::compose_rle;

/// Ingests an `f32` array.
pub fn ingest_f32<S: NodeStore>(store: &S, values: &[f32]) -> Result<NodeHandle> {
    ingest(store, values.iter().map(|v| Seed::Float32Bits(v.to_bits())))
}

/// Ingests an `f64` array.
pub fn ingest_f64<S: NodeStore>(store: &S, values: &[f64]) -> Result<NodeHandle> {
    ingest(store, values.iter().map(|v| Seed::Float64Bits(v.to_bits())))
}

fn ingest<S: NodeStore>(store: &S, seeds: impl Iterator<Item = Seed> + ExactSizeIterator) -> Result<NodeHandle> {
    if seeds.len() == 0 {
        return Err(SubstrateError::Precondition(
            "cannot ingest an empty float array".to_string(),
        ));
    }

    let handles: Result<Vec<NodeHandle>> = seeds.map(|s| store.get_or_insert_constant(s)).collect();
    let handles = handles?;

    if handles.len() == 1 {
        return Ok(handles[0]);
    }
    compose_rle(store, &handles, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::reconstruct::reconstruct_f32_bits;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn reconstructs_f32_array_bit_exactly_including_nan() {
        let store = InMemoryStore::new();
        let values = [1.0f32, f32::NAN, -0.0, f32::INFINITY];
        let handle = ingest_f32(&store, &values).unwrap();
        let bits = reconstruct_f32_bits(&store, handle.node).unwrap();
        let expected: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits, expected);
    }

    #[test]
    fn empty_array_is_an_error() {
        let store = InMemoryStore::new();
        assert!(ingest_f32(&store, &[]).is_err());
        assert!(ingest_f64(&store, &[]).is_err());
    }

    #[test]
    fn adjacent_equal_bit_patterns_are_run_length_encoded() {
        let store = InMemoryStore::new();
        let values = [2.5f32, 2.5, 2.5, 1.0];
        let handle = ingest_f32(&store, &values).unwrap();
        let children = store.composition_children(handle.id()).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].multiplicity, 3);
    }
}
