//! Property tests for the quantified invariants in `spec.md` §8 that
//! belong to `substrate-core` (projection, hashing, Hilbert round-trip).
//! Ingestion-level properties (text/byte/float round-trip through a
//! real store) live in `substrate-ingest`'s test suite instead.

use proptest::prelude::*;
use substrate_core::hash::{hash_constant, ContentHash};
use substrate_core::hilbert;
use substrate_core::project;
use substrate_core::seed::Seed;

fn arb_seed() -> impl Strategy<Value = Seed> {
    prop_oneof![
        (0u32..=0x10FFFF).prop_filter_map("skip surrogates", |cp| Seed::codepoint(cp).ok()),
        any::<u8>().prop_map(Seed::Byte),
        any::<i64>().prop_map(Seed::Integer64),
        any::<u32>().prop_map(Seed::Float32Bits),
        any::<u64>().prop_map(Seed::Float64Bits),
    ]
}

proptest! {
    #[test]
    fn projection_lands_on_unit_sphere(seed in arb_seed()) {
        let p = project(&seed);
        prop_assert!((p.norm_sq() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn projection_is_deterministic(seed in arb_seed()) {
        prop_assert_eq!(project(&seed), project(&seed));
    }

    #[test]
    fn distinct_seeds_hash_distinctly(a in arb_seed(), b in arb_seed()) {
        prop_assume!(a != b);
        prop_assert_ne!(hash_constant(&a), hash_constant(&b));
    }

    #[test]
    fn hilbert_round_trip_bounded(x in -1.0f64..=1.0, y in -1.0f64..=1.0, z in -1.0f64..=1.0, m in -1.0f64..=1.0) {
        let (hi, lo) = hilbert::hilbert_of_point([x, y, z, m]);
        let [rx, ry, rz, rm] = hilbert::point_of_hilbert(hi, lo);
        let bound = hilbert::max_quantization_error();
        prop_assert!((rx - x).abs() <= bound + 1e-12);
        prop_assert!((ry - y).abs() <= bound + 1e-12);
        prop_assert!((rz - z).abs() <= bound + 1e-12);
        prop_assert!((rm - m).abs() <= bound + 1e-12);
    }

    #[test]
    fn surrogate_codepoints_are_never_constructible(cp in 0xD800u32..=0xDFFF) {
        prop_assert!(Seed::codepoint(cp).is_err());
    }
}

#[test]
fn hilbert_locality_beats_random_pairing() {
    // For N random seeds, the median distance between Hilbert-adjacent
    // pairs should be smaller than the median distance between pairs at
    // rank distance N/4 (spec.md §8, "Hilbert locality (statistical)").
    use substrate_core::point::Point4;

    let n = 400usize;
    let mut points: Vec<(u128, Point4)> = (0..n)
        .map(|i| {
            let seed = Seed::Integer64(i as i64 * 7919);
            let p = project(&seed);
            let (hi, lo) = hilbert::hilbert_of_point([p.x, p.y, p.z, p.m]);
            (((hi as u128) << 64) | lo as u128, p)
        })
        .collect();
    points.sort_by_key(|(idx, _)| *idx);

    let mut adjacent: Vec<f64> = (0..points.len() - 1)
        .map(|i| points[i].1.distance(&points[i + 1].1))
        .collect();
    let quarter = n / 4;
    let mut far: Vec<f64> = (0..points.len() - quarter)
        .map(|i| points[i].1.distance(&points[i + quarter].1))
        .collect();

    adjacent.sort_by(|a, b| a.partial_cmp(b).unwrap());
    far.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let median = |v: &[f64]| v[v.len() / 2];
    assert!(
        median(&adjacent) < median(&far),
        "adjacent median {} should be below far median {}",
        median(&adjacent),
        median(&far)
    );
}

#[test]
fn no_observed_hash_collisions_in_corpus() {
    use std::collections::HashSet;
    let mut seen: HashSet<ContentHash> = HashSet::new();
    for cp in 0u32..=0xFFFF {
        if let Ok(seed) = Seed::codepoint(cp) {
            assert!(seen.insert(hash_constant(&seed)), "collision at U+{cp:04X}");
        }
    }
}
