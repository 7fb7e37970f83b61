//! Immutable spatial index over a keypoint set.
//!
//! `KeypointIndex` answers the proximity queries drawing tools issue on every
//! pointer move. It is built once from a [`KeypointSet`] and never changes, so
//! it can be shared across threads without synchronization.

mod hilbert;

use crate::keypoint::{KeypointSet, Point};
use crate::trace::{trace_event, trace_span};
use hilbert::HilbertTree;

/// Read-only nearest-neighbour index over keypoints.
#[derive(Clone, Debug)]
pub struct KeypointIndex {
    points: Vec<Point>,
    tree: Option<HilbertTree>,
}

impl KeypointIndex {
    /// Builds the index. An empty set yields an empty, queryable index
    /// without building a tree.
    pub fn new(keypoints: KeypointSet) -> Self {
        let points = keypoints.into_points();
        if points.is_empty() {
            return Self { points, tree: None };
        }

        let _span = trace_span!("build_index", points = points.len()).entered();
        let tree = HilbertTree::build(&points);
        trace_event!("index_built", points = points.len());
        Self {
            points,
            tree: Some(tree),
        }
    }

    /// Returns every keypoint in construction order.
    pub fn list_all(&self) -> &[Point] {
        &self.points
    }

    /// Number of indexed keypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the index holds no keypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns keypoints ordered by ascending Euclidean distance from
    /// `(x, y)`.
    ///
    /// `max_results` caps the number of returned points and `max_distance`
    /// drops points farther than it (points exactly at `max_distance` are
    /// kept); both bounds may be combined. Equal distances are ordered by
    /// position in [`list_all`](Self::list_all).
    ///
    /// Non-finite query coordinates, a negative or NaN `max_distance`, and
    /// `max_results == Some(0)` all produce an empty result.
    pub fn neighbors(
        &self,
        x: f32,
        y: f32,
        max_results: Option<usize>,
        max_distance: Option<f32>,
    ) -> Vec<Point> {
        self.neighbor_indices(x, y, max_results, max_distance)
            .into_iter()
            .map(|idx| self.points[idx])
            .collect()
    }

    /// Like [`neighbors`](Self::neighbors) but returns positions in
    /// [`list_all`](Self::list_all).
    pub fn neighbor_indices(
        &self,
        x: f32,
        y: f32,
        max_results: Option<usize>,
        max_distance: Option<f32>,
    ) -> Vec<usize> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        if !x.is_finite() || !y.is_finite() {
            return Vec::new();
        }
        let max_dist_sq = match max_distance {
            Some(d) if d.is_nan() || d < 0.0 => return Vec::new(),
            Some(d) => d * d,
            None => f32::INFINITY,
        };
        tree.neighbors(
            &self.points,
            x,
            y,
            max_results.unwrap_or(usize::MAX),
            max_dist_sq,
        )
    }

    /// Nearest keypoint to `(x, y)`, if any.
    pub fn nearest(&self, x: f32, y: f32) -> Option<Point> {
        self.neighbors(x, y, Some(1), None).into_iter().next()
    }

    /// All keypoints within `radius` of `(x, y)`, nearest first.
    pub fn within(&self, x: f32, y: f32, radius: f32) -> Vec<Point> {
        self.neighbors(x, y, None, Some(radius))
    }
}

impl From<KeypointSet> for KeypointIndex {
    fn from(keypoints: KeypointSet) -> Self {
        Self::new(keypoints)
    }
}
