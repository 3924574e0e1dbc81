// Inner-product kernels for the exact index.
// AVX2/FMA on x86_64 and NEON on aarch64, with a two-accumulator scalar fallback.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

/// Below this length the scalar loop wins over the SIMD setup cost.
const MIN_DIM_SIMD: usize = 16;

/// Dot product of two equally sized slices.
///
/// Slices of different length score 0.0; callers validate dimensions first.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIMD
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            // SAFETY: both features were detected at runtime and lengths are equal.
            return unsafe { dot_product_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if a.len() >= MIN_DIM_SIMD && std::arch::is_aarch64_feature_detected!("neon") {
            // SAFETY: neon was detected at runtime and lengths are equal.
            return unsafe { dot_product_neon(a, b) };
        }
    }

    dot_product_scalar(a, b)
}

/// Euclidean length of `v`.
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Multiply every component of `v` by `factor` in place.
#[inline]
pub fn scale_in_place(v: &mut [f32], factor: f32) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_product_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;

    let mut acc1 = _mm256_setzero_ps();
    let mut acc2 = _mm256_setzero_ps();

    while i + 16 <= dim {
        let x1 = _mm256_loadu_ps(a.as_ptr().add(i));
        let y1 = _mm256_loadu_ps(b.as_ptr().add(i));
        let x2 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
        let y2 = _mm256_loadu_ps(b.as_ptr().add(i + 8));
        acc1 = _mm256_fmadd_ps(x1, y1, acc1);
        acc2 = _mm256_fmadd_ps(x2, y2, acc2);
        i += 16;
    }

    let acc = _mm256_add_ps(acc1, acc2);
    let high = _mm256_extractf128_ps(acc, 1);
    let low = _mm256_castps256_ps128(acc);
    let mut quad = _mm_add_ps(high, low);
    quad = _mm_hadd_ps(quad, quad);
    quad = _mm_hadd_ps(quad, quad);
    let mut dot = _mm_cvtss_f32(quad);

    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }
    dot
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn dot_product_neon(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;

    let mut acc1 = vdupq_n_f32(0.0);
    let mut acc2 = vdupq_n_f32(0.0);

    while i + 8 <= dim {
        let x1 = vld1q_f32(a.as_ptr().add(i));
        let y1 = vld1q_f32(b.as_ptr().add(i));
        let x2 = vld1q_f32(a.as_ptr().add(i + 4));
        let y2 = vld1q_f32(b.as_ptr().add(i + 4));
        acc1 = vfmaq_f32(acc1, x1, y1);
        acc2 = vfmaq_f32(acc2, x2, y2);
        i += 8;
    }

    let mut dot = vaddvq_f32(vaddq_f32(acc1, acc2));
    while i < dim {
        dot += a[i] * b[i];
        i += 1;
    }
    dot
}

#[inline]
fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut even = 0.0f32;
    let mut odd = 0.0f32;

    let pairs_a = a.chunks_exact(2);
    let tail_a = pairs_a.remainder();
    let pairs_b = b.chunks_exact(2);
    let tail_b = pairs_b.remainder();

    for (x, y) in pairs_a.zip(pairs_b) {
        even += x[0] * y[0];
        odd += x[1] * y[1];
    }
    for (x, y) in tail_a.iter().zip(tail_b) {
        even += x * y;
    }

    even + odd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_matches_naive_across_lengths() {
        for dim in [0usize, 1, 3, 7, 15, 16, 17, 33, 128, 385] {
            let a: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.37).sin()).collect();
            let b: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.11).cos()).collect();
            let expected = naive_dot(&a, &b);
            let actual = dot_product(&a, &b);
            assert!(
                (expected - actual).abs() < 1e-3,
                "dim {}: expected {}, got {}",
                dim,
                expected,
                actual
            );
        }
    }

    #[test]
    fn test_dot_length_mismatch_is_zero() {
        assert_eq!(dot_product(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_norm() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(norm(&[]), 0.0);
    }

    #[test]
    fn test_scale_in_place() {
        let mut v = vec![1.0, -2.0, 4.0];
        scale_in_place(&mut v, 0.5);
        assert_eq!(v, vec![0.5, -1.0, 2.0]);
    }
}
