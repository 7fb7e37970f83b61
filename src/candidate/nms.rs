//! Minimum-distance suppression for corner candidates.

use crate::candidate::{sort_corners_desc, Corner};
use crate::util::math::dist_sq;

/// Greedily keeps the strongest corners that are at least `min_distance`
/// apart (Euclidean), up to `max_points` (`0` keeps every survivor).
///
/// Candidates are sorted by descending score first. A candidate closer than
/// `min_distance` to any previously kept corner is dropped. Kept corners are
/// bucketed in a grid of `min_distance`-sized cells so each test only visits
/// the 3x3 neighbouring cells.
pub fn suppress_min_distance(
    corners: &mut [Corner],
    width: usize,
    height: usize,
    min_distance: f32,
    max_points: usize,
) -> Vec<Corner> {
    sort_corners_desc(corners);
    let limit = if max_points == 0 {
        corners.len()
    } else {
        max_points.min(corners.len())
    };

    // Distinct integer pixels are already at least one pixel apart.
    if min_distance < 1.0 {
        return corners[..limit].to_vec();
    }

    let cell = min_distance;
    let grid_w = ((width as f32) / cell).ceil().max(1.0) as usize;
    let grid_h = ((height as f32) / cell).ceil().max(1.0) as usize;
    let mut grid: Vec<Vec<(f32, f32)>> = vec![Vec::new(); grid_w * grid_h];
    let min_dist_sq = min_distance * min_distance;

    let mut kept = Vec::with_capacity(limit);
    for corner in corners.iter().copied() {
        if kept.len() >= limit {
            break;
        }
        let px = corner.x as f32;
        let py = corner.y as f32;
        let cx = ((px / cell) as usize).min(grid_w - 1);
        let cy = ((py / cell) as usize).min(grid_h - 1);

        let x0 = cx.saturating_sub(1);
        let y0 = cy.saturating_sub(1);
        let x1 = (cx + 1).min(grid_w - 1);
        let y1 = (cy + 1).min(grid_h - 1);

        let crowded = (y0..=y1).any(|gy| {
            (x0..=x1).any(|gx| {
                grid[gy * grid_w + gx]
                    .iter()
                    .any(|&(kx, ky)| dist_sq(px, py, kx, ky) < min_dist_sq)
            })
        });
        if crowded {
            continue;
        }

        grid[cy * grid_w + cx].push((px, py));
        kept.push(corner);
    }

    kept
}
