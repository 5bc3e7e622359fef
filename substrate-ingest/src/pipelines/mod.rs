//! Universal ingestion pipelines (spec §4.5): one per modality, each
//! reducing its input to constants + compositions with run-length
//! encoding over adjacent equal children. Pipeline-specific logic is
//! entirely in how the input is tokenized into a sequence of seeds or
//! child node handles; every pipeline bottoms out in the same two
//! [`substrate_core::store::NodeStore`] operations.

pub mod bytes;
pub mod floats;
pub mod image;
pub mod audio;
pub mod json;

use substrate_core::node::{CompositionGeometry, NodeHandle};
use substrate_core::point::Point4;
use substrate_core::store::{ChildRun, NodeStore};
use substrate_core::Result;

/// Run-length-encodes a sequence of already-addressed node handles and
/// publishes the resulting composition. Shared by every pipeline that
/// builds a single flat composition (bytes, float arrays, image rows).
pub(crate) fn compose_rle<S: NodeStore>(
    store: &S,
    handles: &[NodeHandle],
    type_ref: Option<substrate_core::node::NodeId>,
) -> Result<NodeHandle> {
    let mut runs: Vec<ChildRun> = Vec::new();
    for handle in handles {
        if let Some(last) = runs.last_mut() {
            if last.content_hash == handle.content_hash {
                last.multiplicity += 1;
                continue;
            }
        }
        runs.push(ChildRun {
            child: handle.node,
            content_hash: handle.content_hash,
            multiplicity: 1,
        });
    }

    let positions: Vec<Point4> = handles.iter().map(|h| h.position).collect();
    let geometry = if positions.len() <= 1 {
        CompositionGeometry::Point(positions.first().copied().unwrap_or(Point4::new(0.0, 0.0, 0.0, 1.0)))
    } else {
        CompositionGeometry::Trajectory(positions)
    };

    store.get_or_insert_composition(&runs, type_ref, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::seed::Seed;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn compose_rle_collapses_adjacent_equal_children() {
        let store = InMemoryStore::new();
        let a = store.get_or_insert_constant(Seed::Byte(9)).unwrap();
        let b = store.get_or_insert_constant(Seed::Byte(10)).unwrap();
        let handles = vec![a, a, a, b];
        let composed = compose_rle(&store, &handles, None).unwrap();
        let children = store.composition_children(composed.id()).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].multiplicity, 3);
        assert_eq!(children[1].multiplicity, 1);
    }
}
