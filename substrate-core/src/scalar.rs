//! Scalar reference implementations of the batch vector operations the
//! bulk ingestor needs: pairwise distance and centroid. Always
//! available; the `simd` feature's accelerated path is tested against
//! these for bit-identical output (see `src/simd.rs`).
//!
//! Attention-weight batch ops are not implemented here: softmax-based
//! nearest-neighbor querying is explicitly out of scope for this
//! substrate (`spec.md` §1).

use crate::point::Point4;

/// Centroid of a non-empty slice of points. Panics on an empty slice —
/// callers (composition geometry, in particular) never hand this an
/// empty child list, since an empty composition is rejected upstream as
/// a precondition violation.
#[must_use]
pub fn centroid(points: &[Point4]) -> Point4 {
    assert!(!points.is_empty(), "centroid of an empty point set is undefined");
    let mut sum = Point4::new(0.0, 0.0, 0.0, 0.0);
    for p in points {
        sum.x += p.x;
        sum.y += p.y;
        sum.z += p.z;
        sum.m += p.m;
    }
    let n = points.len() as f64;
    Point4::new(sum.x / n, sum.y / n, sum.z / n, sum.m / n)
}

/// Pairwise Euclidean distance between two equal-length slices of
/// points, elementwise: `out[i] = distance(a[i], b[i])`.
#[must_use]
pub fn pairwise_distance(a: &[Point4], b: &[Point4]) -> Vec<f64> {
    assert_eq!(a.len(), b.len(), "pairwise_distance requires equal-length slices");
    a.iter().zip(b.iter()).map(|(x, y)| x.distance(y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_single_point_is_itself() {
        let p = Point4::new(0.1, 0.2, 0.3, 0.9);
        assert_eq!(centroid(&[p]), p);
    }

    #[test]
    fn pairwise_distance_matches_manual_computation() {
        let a = [Point4::new(0.0, 0.0, 0.0, 1.0)];
        let b = [Point4::new(1.0, 0.0, 0.0, 0.0)];
        let d = pairwise_distance(&a, &b);
        assert!((d[0] - 2f64.sqrt()).abs() < 1e-12);
    }
}
