//! Row-wise minimum eigenvalue of the structure tensor.
//!
//! With the `simd` feature the bulk of each row is evaluated eight lanes at a
//! time using `f32x8`; the tail always goes through the scalar path.

use crate::util::math::min_eigenvalue;

/// Writes `min_eigenvalue(a[i], b[i], c[i])` into `out[i]`.
#[cfg(not(feature = "simd"))]
pub(crate) fn min_eigen_row(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
    min_eigen_scalar(a, b, c, out);
}

#[cfg(feature = "simd")]
pub(crate) fn min_eigen_row(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
    use wide::f32x8;

    const LANES: usize = 8;
    let len = out.len();
    let simd_end = len / LANES * LANES;
    let half = f32x8::splat(0.5);

    for start in (0..simd_end).step_by(LANES) {
        let end = start + LANES;
        let va = load_f32x8(&a[start..end]);
        let vb = load_f32x8(&b[start..end]);
        let vc = load_f32x8(&c[start..end]);
        let half_trace = (va + vc) * half;
        let half_diff = (va - vc) * half;
        let lambda = half_trace - (half_diff * half_diff + vb * vb).sqrt();
        out[start..end].copy_from_slice(&lambda.to_array());
    }

    min_eigen_scalar(
        &a[simd_end..],
        &b[simd_end..],
        &c[simd_end..],
        &mut out[simd_end..],
    );
}

#[cfg(feature = "simd")]
#[inline]
fn load_f32x8(slice: &[f32]) -> wide::f32x8 {
    wide::f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

fn min_eigen_scalar(a: &[f32], b: &[f32], c: &[f32], out: &mut [f32]) {
    for (((dst, &a), &b), &c) in out.iter_mut().zip(a).zip(b).zip(c) {
        *dst = min_eigenvalue(a, b, c);
    }
}
