//! Minimum-eigenvalue corner detection ("good features to track").
//!
//! Pipeline:
//! 1. 3x3 Sobel derivatives with replicated borders.
//! 2. Derivative products summed over a `block_size` box window.
//! 3. Corner quality = smaller eigenvalue of the 2x2 structure tensor.
//! 4. Responses at or below `quality_level * max` are discarded; survivors
//!    must be 3x3 local maxima away from the one-pixel image border.
//! 5. Strongest-first minimum-distance suppression up to `max_points`.
//!
//! Every stage is computed row by row, so with the `rayon` feature and
//! `parallel = true` rows are distributed across the runtime thread pool.
//! Row results do not depend on scheduling, so sequential and parallel runs
//! produce identical keypoints.

use crate::candidate::nms::suppress_min_distance;
use crate::candidate::Corner;
use crate::detect::eigen::min_eigen_row;
use crate::detect::CornerParams;
use crate::image::ImageView;
use crate::keypoint::{KeypointSet, Point};
use crate::trace::{trace_event, trace_span};
use crate::util::MagsnapResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub(crate) fn detect_corners(
    image: ImageView<'_, u8>,
    params: &CornerParams,
) -> MagsnapResult<KeypointSet> {
    let width = image.width();
    let height = image.height();
    let _span = trace_span!("detect_corners", width = width, height = height).entered();

    let response = corner_response(image, params.block_size, params.parallel);
    let max_response = response.iter().copied().fold(0.0f32, f32::max);
    if max_response <= 0.0 {
        trace_event!("corners_flat_image", max_response = max_response);
        return Ok(KeypointSet::empty());
    }

    let threshold = max_response * params.quality_level;
    let mut candidates = local_maxima(&response, width, height, threshold);
    let candidate_count = candidates.len();
    let kept = suppress_min_distance(
        &mut candidates,
        width,
        height,
        params.min_distance,
        params.max_points,
    );

    trace_event!(
        "corners_detected",
        candidates = candidate_count,
        kept = kept.len()
    );
    Ok(kept
        .into_iter()
        .map(|c| Point::new(c.x as f32, c.y as f32))
        .collect())
}

/// Computes the per-pixel minimum-eigenvalue corner response.
///
/// The returned buffer is row-major with `image.width()` columns.
/// `block_size` is clamped to at least 1.
pub fn corner_response(image: ImageView<'_, u8>, block_size: usize, parallel: bool) -> Vec<f32> {
    let width = image.width();
    let height = image.height();
    let len = width * height;
    let block_size = block_size.max(1);

    let mut ix = vec![0.0f32; len];
    let mut iy = vec![0.0f32; len];
    for_each_row(&mut ix, width, parallel, |y, row| sobel_x_row(image, y, row));
    for_each_row(&mut iy, width, parallel, |y, row| sobel_y_row(image, y, row));

    let mut xx = vec![0.0f32; len];
    let mut xy = vec![0.0f32; len];
    let mut yy = vec![0.0f32; len];
    for_each_row(&mut xx, width, parallel, |y, row| {
        product_row(&ix, &ix, y * width, row)
    });
    for_each_row(&mut xy, width, parallel, |y, row| {
        product_row(&ix, &iy, y * width, row)
    });
    for_each_row(&mut yy, width, parallel, |y, row| {
        product_row(&iy, &iy, y * width, row)
    });
    drop(ix);
    drop(iy);

    let a = box_sum(&xx, width, height, block_size, parallel);
    let b = box_sum(&xy, width, height, block_size, parallel);
    let c = box_sum(&yy, width, height, block_size, parallel);

    let mut response = vec![0.0f32; len];
    for_each_row(&mut response, width, parallel, |y, row| {
        let start = y * width;
        let end = start + width;
        min_eigen_row(&a[start..end], &b[start..end], &c[start..end], row);
    });
    response
}

#[cfg(feature = "rayon")]
fn for_each_row<F>(out: &mut [f32], width: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if parallel {
        out.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        out.chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

#[cfg(not(feature = "rayon"))]
fn for_each_row<F>(out: &mut [f32], width: usize, _parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]),
{
    out.chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

fn sobel_x_row(image: ImageView<'_, u8>, y: usize, row: &mut [f32]) {
    let y = y as isize;
    for (x, dst) in row.iter_mut().enumerate() {
        let x = x as isize;
        let p = |dx: isize, dy: isize| f32::from(image.at_clamped(x + dx, y + dy));
        *dst = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    }
}

fn sobel_y_row(image: ImageView<'_, u8>, y: usize, row: &mut [f32]) {
    let y = y as isize;
    for (x, dst) in row.iter_mut().enumerate() {
        let x = x as isize;
        let p = |dx: isize, dy: isize| f32::from(image.at_clamped(x + dx, y + dy));
        *dst = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    }
}

fn product_row(lhs: &[f32], rhs: &[f32], start: usize, row: &mut [f32]) {
    let end = start + row.len();
    for ((dst, &l), &r) in row.iter_mut().zip(&lhs[start..end]).zip(&rhs[start..end]) {
        *dst = l * r;
    }
}

/// Sums `src` over a `block x block` window with replicated borders.
///
/// Odd sizes are centred; even sizes extend one pixel further up and left.
fn box_sum(src: &[f32], width: usize, height: usize, block: usize, parallel: bool) -> Vec<f32> {
    if block == 1 {
        return src.to_vec();
    }
    let before = (block / 2) as isize;
    let after = (block - 1) as isize - before;
    let clamp_x = |x: isize| x.clamp(0, width as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, height as isize - 1) as usize;

    let mut horizontal = vec![0.0f32; src.len()];
    for_each_row(&mut horizontal, width, parallel, |y, row| {
        let src_row = &src[y * width..(y + 1) * width];
        for (x, dst) in row.iter_mut().enumerate() {
            let x = x as isize;
            *dst = (x - before..=x + after).map(|sx| src_row[clamp_x(sx)]).sum();
        }
    });

    let mut out = vec![0.0f32; src.len()];
    for_each_row(&mut out, width, parallel, |y, row| {
        let y = y as isize;
        for (x, dst) in row.iter_mut().enumerate() {
            *dst = (y - before..=y + after)
                .map(|sy| horizontal[clamp_y(sy) * width + x])
                .sum();
        }
    });
    out
}

/// Collects responses above `threshold` that are not exceeded by any of
/// their eight neighbours. The outermost pixel ring is never reported.
fn local_maxima(response: &[f32], width: usize, height: usize, threshold: f32) -> Vec<Corner> {
    let mut out = Vec::new();
    if width < 3 || height < 3 {
        return out;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let score = response[y * width + x];
            if score <= threshold {
                continue;
            }
            let is_max = (y - 1..=y + 1).all(|ny| {
                (x - 1..=x + 1).all(|nx| response[ny * width + nx] <= score)
            });
            if is_max {
                out.push(Corner { x, y, score });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{box_sum, corner_response, local_maxima};
    use crate::image::ImageView;

    #[test]
    fn box_sum_replicates_borders() {
        let src = [1.0f32, 2.0, 3.0];
        let out = box_sum(&src, 3, 1, 3, false);
        assert_eq!(out, vec![12.0, 18.0, 24.0]);
    }

    #[test]
    fn flat_image_has_zero_response() {
        let data = vec![90u8; 12 * 9];
        let view = ImageView::from_slice(&data, 12, 9).unwrap();
        let response = corner_response(view, 3, false);
        assert!(response.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn corner_responds_more_than_edge() {
        // Bright quadrant with its corner at (8, 8).
        let width = 16;
        let height = 16;
        let mut data = vec![0u8; width * height];
        for y in 8..height {
            for x in 8..width {
                data[y * width + x] = 200;
            }
        }
        let view = ImageView::from_slice(&data, width, height).unwrap();
        let response = corner_response(view, 3, false);
        let at = |x: usize, y: usize| response[y * width + x];
        assert!(at(8, 8) > at(8, 13));
        assert!(at(8, 8) > at(13, 8));
        assert!(at(8, 8) > 0.0);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn flat_image_detection_logs_with_tracing() {
        let data = vec![40u8; 8 * 8];
        let view = ImageView::from_slice(&data, 8, 8).unwrap();
        let keypoints = super::detect_corners(view, &crate::detect::CornerParams::default()).unwrap();
        assert!(keypoints.is_empty());
    }

    #[test]
    fn local_maxima_skip_border_and_threshold() {
        let mut response = vec![0.0f32; 5 * 5];
        response[2 * 5 + 2] = 3.0;
        response[2 * 5 + 3] = 1.0;
        response[0] = 9.0;
        let maxima = local_maxima(&response, 5, 5, 0.5);
        assert_eq!(maxima.len(), 1);
        assert_eq!((maxima[0].x, maxima[0].y), (2, 2));
    }
}
