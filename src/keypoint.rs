//! Keypoint value types shared by detectors and the spatial index.

use crate::util::math::dist_sq;

/// A location in image-pixel space. Sub-pixel coordinates are allowed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Horizontal coordinate (column).
    pub x: f32,
    /// Vertical coordinate (row).
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `(x, y)`.
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        dist_sq(self.x, self.y, x, y).sqrt()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Ordered keypoints produced by one detection run over one image.
///
/// The order is the detector's emission order; it only matters for index
/// stability (`KeypointIndex::list_all` preserves it).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeypointSet {
    points: Vec<Point>,
}

impl KeypointSet {
    /// Wraps detector output.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// A set with no keypoints; a valid detection outcome.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the keypoints in emission order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of keypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the detector found nothing.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consumes the set, returning the keypoints.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

impl FromIterator<Point> for KeypointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
