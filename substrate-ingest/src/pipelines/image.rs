//! Image ingestion: each row becomes a composition of pixel constants;
//! the image is a composition of row compositions. Width and height are
//! carried via the root's `type_ref`, a small two-constant "type atom"
//! composition shared by every image of the same dimensions.

use substrate_core::node::{CompositionGeometry, NodeHandle};
use substrate_core::seed::Seed;
use substrate_core::store::{ChildRun, NodeStore};
use substrate_core::{Result, SubstrateError};

use super::compose_rle;

/// A decoded image: pixels in row-major order, one `u32` per pixel
/// (packed however the caller's color space dictates — the pipeline
/// only needs bit-exact equality, not color semantics).
pub struct Image<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u32],
}

/// Ingests an image, producing a composition of row compositions tagged
/// with a `(width, height)` type atom.
pub fn ingest_image<S: NodeStore>(store: &S, image: &Image<'_>) -> Result<NodeHandle> {
    let expected = image.width as usize * image.height as usize;
    if expected == 0 {
        return Err(SubstrateError::Precondition(
            "image width and height must both be non-zero".to_string(),
        ));
    }
    if image.pixels.len() != expected {
        return Err(SubstrateError::Precondition(format!(
            "image declares {expected} pixels but {} were supplied",
            image.pixels.len()
        )));
    }

    let type_atom = dimensions_type_atom(store, image.width, image.height)?;

    let mut rows = Vec::with_capacity(image.height as usize);
    for row in image.pixels.chunks(image.width as usize) {
        let pixel_handles: Result<Vec<NodeHandle>> = row
            .iter()
            .map(|&p| store.get_or_insert_constant(Seed::Integer64(i64::from(p))))
            .collect();
        let pixel_handles = pixel_handles?;
        let row_handle = if pixel_handles.len() == 1 {
            pixel_handles[0]
        } else {
            compose_rle(store, &pixel_handles, None)?
        };
        rows.push(row_handle);
    }

    let root = if rows.len() == 1 {
        rows[0]
    } else {
        let runs: Vec<ChildRun> = rows
            .iter()
            .map(|h| ChildRun {
                child: h.node,
                content_hash: h.content_hash,
                multiplicity: 1,
            })
            .collect();
        let positions = rows.iter().map(|h| h.position).collect();
        store.get_or_insert_composition(&runs, Some(type_atom.id()), CompositionGeometry::Trajectory(positions))?
    };

    Ok(root)
}

fn dimensions_type_atom<S: NodeStore>(store: &S, width: u32, height: u32) -> Result<NodeHandle> {
    let w = store.get_or_insert_constant(Seed::Integer64(i64::from(width)))?;
    let h = store.get_or_insert_constant(Seed::Integer64(i64::from(height)))?;
    let runs = [
        ChildRun {
            child: w.node,
            content_hash: w.content_hash,
            multiplicity: 1,
        },
        ChildRun {
            child: h.node,
            content_hash: h.content_hash,
            multiplicity: 1,
        },
    ];
    store.get_or_insert_composition(
        &runs,
        None,
        CompositionGeometry::Trajectory(vec![w.position, h.position]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrate_core::reconstruct::reconstruct_seeds;
    use substrate_test_support::InMemoryStore;

    #[test]
    fn reconstructs_pixels_in_row_major_order() {
        let store = InMemoryStore::new();
        let pixels = [1u32, 2, 3, 4, 5, 6];
        let image = Image {
            width: 3,
            height: 2,
            pixels: &pixels,
        };
        let handle = ingest_image(&store, &image).unwrap();
        let seeds = reconstruct_seeds(&store, handle.node).unwrap();
        let values: Vec<i64> = seeds
            .into_iter()
            .map(|s| match s {
                Seed::Integer64(v) => v,
                _ => panic!("expected integer seeds"),
            })
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn mismatched_pixel_count_is_an_error() {
        let store = InMemoryStore::new();
        let pixels = [1u32, 2, 3];
        let image = Image {
            width: 2,
            height: 2,
            pixels: &pixels,
        };
        assert!(ingest_image(&store, &image).is_err());
    }

    #[test]
    fn same_dimensions_share_a_type_atom() {
        let store = InMemoryStore::new();
        let pixels_a = [1u32, 2, 3, 4];
        let pixels_b = [9u32, 9, 9, 9];
        let a = ingest_image(&store, &Image { width: 2, height: 2, pixels: &pixels_a }).unwrap();
        let b = ingest_image(&store, &Image { width: 2, height: 2, pixels: &pixels_b }).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
