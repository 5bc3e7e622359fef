//! Audio ingestion: samples become a flat, RLE-compressed composition;
//! `(sample_rate, channels, bits)` is carried via the root's `type_ref`,
//! analogous to the image pipeline's dimensions atom.

use substrate_core::node::NodeHandle;
use substrate_core::seed::Seed;
use substrate_core::store::{ChildRun, NodeStore};
use substrate_core::{Result, SubstrateError};

use super::compose_rle;

/// A decoded PCM audio stream. `samples` are interleaved across
/// channels, in frame order.
pub struct Audio<'a> {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: &'a [i32],
}

/// Ingests a PCM sample stream.
pub fn ingest_audio<S: NodeStore>(store: &S, audio: &Audio<'_>) -> Result<NodeHandle> {
    if audio.samples.is_empty() {
        return Err(SubstrateError::Precondition(
            "cannot ingest an empty sample stream".to_string(),
        ));
    }

    let type_atom = header_type_atom(store, audio)?;

    let handles: Result<Vec<NodeHandle>> = audio
        .samples
        .iter()
        .map(|&s| store.get_or_insert_constant(Seed::Integer64(i64::from(s))))
        .collect();
    let handles = handles?;

    if handles.len() == 1 {
        return Ok(handles[0]);
    }
    compose_rle(store, &handles, Some(type_atom.id()))
}

fn header_type_atom<S: NodeStore>(store: &S, audio: &Audio<'_>) -> Result<NodeHandle> {
    let rate = store.get_or_insert_constant(Seed::Integer64(i64::from(audio.sample_rate)))?;
    let channels = store.get_or_insert_constant(Seed::Integer64(i64::from(audio.channels)))?;
    let bits = store.get_or_insert_constant(Seed::Integer64(i64::from(audio.bits_per_sample)))?;

    let runs = [rate, channels, bits].map(|h| ChildRun {
        child: h.node,
        content_hash: h.content_hash,
        multiplicity: 1,
    });
    let positions = [rate, channels, bits].iter().map(|h| h.position).collect();
    store.get_or_insert_composition(
        &runs,
        None,
        substrate_core::node::CompositionGeometry::Trajectory(positions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::reconstruct::reconstruct_seeds;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn reconstructs_samples_in_order() {
        let store = InMemoryStore::new();
        let samples = [10i32, -10, 10, -10];
        let audio = Audio {
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            samples: &samples,
        };
        let handle = ingest_audio(&store, &audio).unwrap();
        let seeds = reconstruct_seeds(&store, handle.node).unwrap();
        let values: Vec<i64> = seeds
            .into_iter()
            .map(|s| match s {
                Seed::Integer64(v) => v,
                _ => panic!("expected integer seeds"),
            })
            .collect();
        assert_eq!(values, vec![10, -10, 10, -10]);
    }

    #[test]
    fn empty_samples_is_an_error() {
        let store = InMemoryStore::new();
        let audio = Audio {
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
            samples: &[],
        };
        assert!(ingest_audio(&store, &audio).is_err());
    }
}
