//! Geometry helpers shared by the detectors and the spatial index.

/// Squared Euclidean distance between two points.
#[inline]
pub(crate) fn dist_sq(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

/// Distance from `coord` to the closed interval `[min, max]` along one axis.
#[inline]
pub(crate) fn axis_distance(coord: f32, min: f32, max: f32) -> f32 {
    if coord < min {
        min - coord
    } else if coord > max {
        coord - max
    } else {
        0.0
    }
}

/// Minimum eigenvalue of the symmetric 2x2 matrix `[[a, b], [b, c]]`.
#[inline]
pub(crate) fn min_eigenvalue(a: f32, b: f32, c: f32) -> f32 {
    let half_trace = 0.5 * (a + c);
    let half_diff = 0.5 * (a - c);
    half_trace - (half_diff * half_diff + b * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{axis_distance, dist_sq, min_eigenvalue};

    #[test]
    fn dist_sq_matches_pythagoras() {
        assert!((dist_sq(0.0, 0.0, 3.0, 4.0) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn axis_distance_is_zero_inside() {
        assert_eq!(axis_distance(2.0, 1.0, 3.0), 0.0);
        assert!((axis_distance(-1.0, 1.0, 3.0) - 2.0).abs() < 1e-6);
        assert!((axis_distance(5.5, 1.0, 3.0) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn min_eigenvalue_of_diagonal_matrix() {
        assert!((min_eigenvalue(4.0, 0.0, 1.0) - 1.0).abs() < 1e-6);
        assert!((min_eigenvalue(2.0, 1.0, 2.0) - 1.0).abs() < 1e-6);
        assert!(min_eigenvalue(0.0, 0.0, 0.0).abs() < 1e-9);
    }
}
