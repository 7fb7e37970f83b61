//! FAST-9 segment-test corners.
//!
//! A pixel `p` is a corner when at least nine contiguous pixels on the
//! radius-3 Bresenham circle around it are all brighter than `p + t` or all
//! darker than `p - t`. The corner score is the larger of the summed excess
//! brightness and summed excess darkness over the circle, which is what
//! non-maximum suppression compares.

use crate::detect::FastParams;
use crate::image::ImageView;
use crate::keypoint::{KeypointSet, Point};
use crate::trace::{trace_event, trace_span};

/// Circle offsets `(dx, dy)`, clockwise from twelve o'clock.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];
const RADIUS: usize = 3;
const ARC_LEN: u32 = 9;

pub(crate) fn detect_fast(image: ImageView<'_, u8>, params: &FastParams) -> KeypointSet {
    let width = image.width();
    let height = image.height();
    let _span = trace_span!("detect_fast", width = width, height = height).entered();

    if width <= 2 * RADIUS || height <= 2 * RADIUS {
        return KeypointSet::empty();
    }

    let scores = fast_scores(image, params.threshold);
    let mut points = Vec::new();

    for y in RADIUS..height - RADIUS {
        for x in RADIUS..width - RADIUS {
            let score = scores[y * width + x];
            if score == 0 {
                continue;
            }
            if params.nonmax_suppression && !is_strict_max(&scores, width, x, y) {
                continue;
            }
            points.push(Point::new(x as f32, y as f32));
        }
    }

    trace_event!("fast_detected", count = points.len());
    KeypointSet::new(points)
}

/// Computes the FAST-9 score of every pixel (`0` for non-corners).
///
/// Pixels closer than three pixels to the border always score `0`.
pub fn fast_scores(image: ImageView<'_, u8>, threshold: u8) -> Vec<u32> {
    let width = image.width();
    let height = image.height();
    let mut scores = vec![0u32; width * height];
    if width <= 2 * RADIUS || height <= 2 * RADIUS {
        return scores;
    }

    let t = i32::from(threshold);
    for y in RADIUS..height - RADIUS {
        for x in RADIUS..width - RADIUS {
            let center = i32::from(image.at_clamped(x as isize, y as isize));
            let mut brighter = 0u32;
            let mut darker = 0u32;
            let mut bright_sum = 0u32;
            let mut dark_sum = 0u32;
            for (bit, &(dx, dy)) in CIRCLE.iter().enumerate() {
                let value = i32::from(image.at_clamped(x as isize + dx, y as isize + dy));
                if value > center + t {
                    brighter |= 1 << bit;
                    bright_sum += (value - center - t) as u32;
                } else if value < center - t {
                    darker |= 1 << bit;
                    dark_sum += (center - t - value) as u32;
                }
            }

            if has_arc(brighter) || has_arc(darker) {
                scores[y * width + x] = bright_sum.max(dark_sum);
            }
        }
    }
    scores
}

/// True when the 16-bit circle mask contains `ARC_LEN` contiguous set bits,
/// wrapping around the circle.
fn has_arc(mask: u32) -> bool {
    let doubled = mask | (mask << 16);
    let mut run = doubled;
    for shift in 1..ARC_LEN {
        run &= doubled >> shift;
    }
    run != 0
}

fn is_strict_max(scores: &[u32], width: usize, x: usize, y: usize) -> bool {
    let score = scores[y * width + x];
    (y - 1..=y + 1).all(|ny| {
        (x - 1..=x + 1).all(|nx| (nx == x && ny == y) || scores[ny * width + nx] < score)
    })
}

#[cfg(test)]
mod tests {
    use super::{fast_scores, has_arc};
    use crate::image::ImageView;

    #[test]
    fn arc_detection_wraps_around() {
        assert!(has_arc(0b1_1111_1111));
        assert!(!has_arc(0b1111_1111));
        // Bits 12..=15 and 0..=4: nine contiguous across the wrap.
        assert!(has_arc(0xF000 | 0b1_1111));
        assert!(!has_arc(0xF000 | 0b1111));
    }

    #[test]
    fn isolated_bright_pixel_is_the_only_response() {
        let width = 9;
        let mut data = vec![0u8; width * width];
        data[4 * width + 4] = 255;
        let view = ImageView::from_slice(&data, width, width).unwrap();
        let scores = fast_scores(view, 20);
        // The centre sees a uniformly darker circle: every bit is set.
        assert!(scores[4 * width + 4] > 0);
        assert_eq!(scores.iter().filter(|&&s| s > 0).count(), 1);
    }

    #[test]
    fn small_images_score_nothing() {
        let data = vec![0u8; 6 * 6];
        let view = ImageView::from_slice(&data, 6, 6).unwrap();
        assert!(fast_scores(view, 10).iter().all(|&s| s == 0));
    }
}
