//! Corner candidates and their pruning.
//!
//! Detectors emit integer-pixel candidates with a response score; pruning
//! orders them deterministically and enforces a minimum pairwise separation.

pub(crate) mod nms;

use std::cmp::Ordering;

/// Corner candidate at an integer pixel location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    /// Column of the candidate.
    pub x: usize,
    /// Row of the candidate.
    pub y: usize,
    /// Detector response at the candidate (higher is stronger).
    pub score: f32,
}

fn corner_cmp_desc(a: &Corner, b: &Corner) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts corners by descending score, breaking ties by row then column.
pub(crate) fn sort_corners_desc(corners: &mut [Corner]) {
    corners.sort_by(corner_cmp_desc);
}

#[cfg(test)]
mod tests {
    use super::{sort_corners_desc, Corner};

    #[test]
    fn ties_fall_back_to_raster_order() {
        let mut corners = vec![
            Corner { x: 4, y: 1, score: 2.0 },
            Corner { x: 2, y: 1, score: 2.0 },
            Corner { x: 9, y: 0, score: 2.0 },
            Corner { x: 0, y: 5, score: 3.0 },
        ];
        sort_corners_desc(&mut corners);
        let order: Vec<_> = corners.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(order, vec![(0, 5), (9, 0), (2, 1), (4, 1)]);
    }
}
