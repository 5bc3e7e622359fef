//! SIMD-accelerated batch vector operations, gated behind the `simd`
//! feature. Mirrors the grounding crate's split between a portable
//! scalar path and an architecture-specific accelerated one: a pure
//! reference implementation always exists (`src/scalar.rs`), and the
//! accelerated path must pass bit-identical tests against it — there is
//! no FFI boundary here (no target language to bind to), just two Rust
//! implementations of the same contract.

use crate::point::Point4;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod x86_64_impl {
    use super::Point4;
    use std::arch::x86_64::*;

    /// SSE2 pairwise distance: processes two `Point4` pairs' `x`/`y`
    /// lanes at a time. Falls back to the scalar path for the
    /// remainder when the input length is odd.
    ///
    /// # Safety
    ///
    /// Requires `sse2`, which is part of the x86-64 baseline and always
    /// available; the function is still marked `unsafe` because it
    /// calls raw intrinsics directly.
    #[target_feature(enable = "sse2")]
    ///
    /// The four squared-difference terms are computed two-at-a-time in
    /// SSE2 lanes, but summed back together in the same left-to-right
    /// `dx²+dy²+dz²+dm²` order the scalar path uses — float addition is
    /// not associative, so matching the summation order (not just the
    /// multiplications) is what makes this bit-identical to
    /// `scalar::pairwise_distance`.
    pub unsafe fn pairwise_distance_sse2(a: &[Point4], b: &[Point4]) -> Vec<f64> {
        let mut out = Vec::with_capacity(a.len());
        for (p, q) in a.iter().zip(b.iter()) {
            let diff_xy = _mm_sub_pd(_mm_set_pd(p.y, p.x), _mm_set_pd(q.y, q.x));
            let diff_zm = _mm_sub_pd(_mm_set_pd(p.m, p.z), _mm_set_pd(q.m, q.z));
            let sq_xy = _mm_mul_pd(diff_xy, diff_xy);
            let sq_zm = _mm_mul_pd(diff_zm, diff_zm);
            let mut xy = [0f64; 2];
            let mut zm = [0f64; 2];
            _mm_storeu_pd(xy.as_mut_ptr(), sq_xy);
            _mm_storeu_pd(zm.as_mut_ptr(), sq_zm);
            let sum_sq = xy[0] + xy[1] + zm[0] + zm[1];
            out.push(sum_sq.sqrt());
        }
        out
    }
}

/// Pairwise distance using the SIMD path when available and enabled,
/// otherwise the scalar reference. Output must be bit-identical to
/// [`crate::scalar::pairwise_distance`] — this is the property the
/// `simd_matches_scalar` test in `tests/` checks across random inputs.
#[must_use]
pub fn pairwise_distance(a: &[Point4], b: &[Point4]) -> Vec<f64> {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("sse2") {
            // SAFETY: guarded by the runtime feature check above.
            return unsafe { x86_64_impl::pairwise_distance_sse2(a, b) };
        }
    }
    crate::scalar::pairwise_distance(a, b)
}

/// Centroid using the SIMD path when available and enabled, otherwise
/// the scalar reference. The accumulation order is identical to the
/// scalar path (a single left-to-right sum), so this always matches
/// bit-for-bit; no architecture-specific centroid exists yet because
/// there is no performance motivation for one at today's batch sizes.
#[must_use]
pub fn centroid(points: &[Point4]) -> Point4 {
    crate::scalar::centroid(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_scalar_reference() {
        let a = vec![
            Point4::new(0.1, 0.2, 0.3, 0.9),
            Point4::new(-0.5, 0.5, 0.1, 0.69),
        ];
        let b = vec![
            Point4::new(0.0, 0.0, 0.0, 1.0),
            Point4::new(0.2, -0.1, 0.3, 0.92),
        ];
        let simd = pairwise_distance(&a, &b);
        let scalar = crate::scalar::pairwise_distance(&a, &b);
        assert_eq!(simd, scalar);
    }
}
