//! Byte-array ingestion: every byte becomes a `BYTE` constant (at most
//! 256 distinct values), composed in source order with RLE over
//! adjacent equal bytes.

use substrate_core::node::NodeHandle;
use substrate_core::seed::Seed;
use substrate_core::store::NodeStore;
use substrate_core::{Result, SubstrateError};

use super::compose_rle;

/// Ingests a raw byte slice, returning the root composition (or, for a
/// single-byte input, the bare constant).
pub fn ingest_bytes<S: NodeStore>(store: &S, data: &[u8]) -> Result<NodeHandle> {
    if data.is_empty() {
        return Err(SubstrateError::Precondition(
            "cannot ingest an empty byte sequence".to_string(),
        ));
    }

    let handles: Result<Vec<NodeHandle>> = data
        .iter()
        .map(|&b| store.get_or_insert_constant(Seed::Byte(b)))
        .collect();
    let handles = handles?;

    if handles.len() == 1 {
        return Ok(handles[0]);
    }
    compose_rle(store, &handles, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::node::NodeRef;
    use substrate_core::reconstruct::reconstruct_bytes;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn single_byte_is_a_constant() {
        let store = InMemoryStore::new();
        let handle = ingest_bytes(&store, &[0x42]).unwrap();
        assert!(matches!(handle.node, NodeRef::Constant(_)));
    }

    #[test]
    fn reconstructs_exactly_with_run_length_encoding() {
        let store = InMemoryStore::new();
        let data = [0x00, 0x00, 0x00, 0x01];
        let handle = ingest_bytes(&store, &data).unwrap();

        let children = store.composition_children(handle.id()).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].multiplicity, 3);
        assert_eq!(children[1].multiplicity, 1);

        let reconstructed = reconstruct_bytes(&store, handle.node).unwrap();
        assert_eq!(reconstructed, data);
    }

    #[test]
    fn identical_inputs_yield_the_same_root() {
        let store = InMemoryStore::new();
        let a = ingest_bytes(&store, &[1, 2, 3]).unwrap();
        let b = ingest_bytes(&store, &[1, 2, 3]).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn empty_input_is_an_error() {
        let store = InMemoryStore::new();
        assert!(ingest_bytes(&store, &[]).is_err());
    }
}
