//! Packed static Hilbert R-tree over points.
//!
//! Layout follows flatbush: leaves occupy positions `[0, num_items)` sorted by
//! the Hilbert value of their position inside the data bounds; each parent
//! level is appended after its children, `NODE_SIZE` children per node, until
//! a single root remains. For a parent, `indices[pos]` is the position of its
//! first child; for a leaf it is the item's index in the original input.

use crate::keypoint::Point;
use crate::util::math::{axis_distance, dist_sq};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

const NODE_SIZE: usize = 16;
const HILBERT_MAX: f32 = (u16::MAX) as f32;

/// Axis-aligned bounding box: `[min_x, min_y, max_x, max_y]`.
type Bounds = [f32; 4];

#[derive(Clone, Debug)]
pub(crate) struct HilbertTree {
    boxes: Vec<Bounds>,
    indices: Vec<usize>,
    level_bounds: Vec<usize>,
    num_items: usize,
}

impl HilbertTree {
    /// Packs `points` into a tree. `points` must not be empty.
    pub(crate) fn build(points: &[Point]) -> Self {
        debug_assert!(!points.is_empty(), "empty point sets bypass the tree");
        let num_items = points.len();

        let mut level_bounds = Vec::new();
        let mut count = num_items;
        let mut total_nodes = num_items;
        level_bounds.push(total_nodes);
        loop {
            count = count.div_ceil(NODE_SIZE);
            total_nodes += count;
            level_bounds.push(total_nodes);
            if count <= 1 {
                break;
            }
        }

        let bounds = points.iter().fold(
            [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY],
            |b, p| [b[0].min(p.x), b[1].min(p.y), b[2].max(p.x), b[3].max(p.y)],
        );
        let span_x = bounds[2] - bounds[0];
        let span_y = bounds[3] - bounds[1];
        let scale = |v: f32, min: f32, span: f32| -> u32 {
            if span > 0.0 {
                ((v - min) / span * HILBERT_MAX).clamp(0.0, HILBERT_MAX) as u32
            } else {
                0
            }
        };

        let mut order: Vec<(u32, usize)> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let hx = scale(p.x, bounds[0], span_x);
                let hy = scale(p.y, bounds[1], span_y);
                (hilbert_index(hx, hy), idx)
            })
            .collect();
        // Index tie-break keeps construction deterministic.
        order.sort_unstable();

        let mut boxes = Vec::with_capacity(total_nodes);
        let mut indices = Vec::with_capacity(total_nodes);
        for &(_, idx) in &order {
            let p = points[idx];
            boxes.push([p.x, p.y, p.x, p.y]);
            indices.push(idx);
        }

        let mut pos = 0;
        for &level_end in &level_bounds[..level_bounds.len() - 1] {
            while pos < level_end {
                let first_child = pos;
                let end = (pos + NODE_SIZE).min(level_end);
                let mut node = boxes[pos];
                for child in &boxes[pos + 1..end] {
                    node[0] = node[0].min(child[0]);
                    node[1] = node[1].min(child[1]);
                    node[2] = node[2].max(child[2]);
                    node[3] = node[3].max(child[3]);
                }
                boxes.push(node);
                indices.push(first_child);
                pos = end;
            }
        }

        Self {
            boxes,
            indices,
            level_bounds,
            num_items,
        }
    }

    /// Visits items in ascending distance from `(x, y)`.
    ///
    /// Returns original item indices, nearest first, stopping after
    /// `max_results` items or before the first item farther than
    /// `max_dist_sq` (squared distance). Equal distances come out in
    /// ascending item index.
    pub(crate) fn neighbors(
        &self,
        points: &[Point],
        x: f32,
        y: f32,
        max_results: usize,
        max_dist_sq: f32,
    ) -> Vec<usize> {
        let mut results = Vec::new();
        if max_results == 0 {
            return results;
        }

        let mut queue: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
        let mut node_index = self.boxes.len() - 1;

        loop {
            let end = (node_index + NODE_SIZE).min(self.upper_bound(node_index));
            let children_are_nodes = node_index >= self.num_items;

            for pos in node_index..end {
                let index = self.indices[pos];
                let dist = if children_are_nodes {
                    let b = &self.boxes[pos];
                    let dx = axis_distance(x, b[0], b[2]);
                    let dy = axis_distance(y, b[1], b[3]);
                    dx * dx + dy * dy
                } else {
                    let p = points[index];
                    dist_sq(x, y, p.x, p.y)
                };
                // Non-finite coordinates rank last and fail any finite bound.
                let dist = if dist.is_nan() { f32::INFINITY } else { dist };
                if dist > max_dist_sq {
                    continue;
                }
                queue.push(Reverse(Entry {
                    dist,
                    is_leaf: !children_are_nodes,
                    id: index,
                }));
            }

            while let Some(Reverse(top)) = queue.peek() {
                if !top.is_leaf {
                    break;
                }
                results.push(top.id);
                queue.pop();
                if results.len() >= max_results {
                    return results;
                }
            }

            match queue.pop() {
                Some(Reverse(next)) => node_index = next.id,
                None => break,
            }
        }

        results
    }

    /// End position of the level containing `node_index`.
    fn upper_bound(&self, node_index: usize) -> usize {
        let level = self.level_bounds.partition_point(|&bound| bound <= node_index);
        self.level_bounds[level.min(self.level_bounds.len() - 1)]
    }
}

/// Priority queue entry: a pending node (by box distance) or an item.
#[derive(Clone, Copy, Debug)]
struct Entry {
    dist: f32,
    is_leaf: bool,
    id: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Nodes sort before leaves at equal distance so every item at that
    // distance is enqueued before any of them is emitted.
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.is_leaf.cmp(&other.is_leaf))
            .then_with(|| self.id.cmp(&other.id))
    }
}

fn interleave(mut x: u32) -> u32 {
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

/// Hilbert curve index of a 16-bit grid cell (public-domain prefix-scan
/// formulation from rawrunprotected/hilbert_curves).
fn hilbert_index(x: u32, y: u32) -> u32 {
    let mut a = x ^ y;
    let mut b = 0xFFFF ^ a;
    let mut c = 0xFFFF ^ (x | y);
    let mut d = x & (y ^ 0xFFFF);

    let mut aa = a | (b >> 1);
    let mut bb = (a >> 1) ^ a;
    let mut cc = ((c >> 1) ^ (b & (d >> 1))) ^ c;
    let mut dd = ((a & (c >> 1)) ^ (d >> 1)) ^ d;

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    aa = (a & (a >> 2)) ^ (b & (b >> 2));
    bb = (a & (b >> 2)) ^ (b & ((a ^ b) >> 2));
    cc ^= (a & (c >> 2)) ^ (b & (d >> 2));
    dd ^= (b & (c >> 2)) ^ ((a ^ b) & (d >> 2));

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    aa = (a & (a >> 4)) ^ (b & (b >> 4));
    bb = (a & (b >> 4)) ^ (b & ((a ^ b) >> 4));
    cc ^= (a & (c >> 4)) ^ (b & (d >> 4));
    dd ^= (b & (c >> 4)) ^ ((a ^ b) & (d >> 4));

    a = aa;
    b = bb;
    c = cc;
    d = dd;
    cc ^= (a & (c >> 8)) ^ (b & (d >> 8));
    dd ^= (b & (c >> 8)) ^ ((a ^ b) & (d >> 8));

    a = cc ^ (cc >> 1);
    b = dd ^ (dd >> 1);

    let i0 = x ^ y;
    let i1 = b | (0xFFFF ^ (i0 | a));

    (interleave(i1) << 1) | interleave(i0)
}
