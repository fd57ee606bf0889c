//! Mask ↔ polygon conversion: Moore-neighbour boundary tracing, scanline
//! polygon fill, and closed-outline rasterization.

pub mod fill;
pub mod outline;

pub use fill::*;
pub use outline::*;

use crate::{
    error::Result,
    traits::ContourExtractor,
    types::{Mask, Point},
};

/// Clockwise on screen (y down), starting east.
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
];

/// Index of a unit step in [`DIRECTIONS`]
#[inline]
fn direction_index(step: (i64, i64)) -> Option<usize> {
    DIRECTIONS.iter().position(|&d| d == step)
}

/// First 4-neighbour of `(x, y)` that is unset or outside the mask,
/// checked west, north, east, south.
fn exposed_side(mask: &Mask, x: i64, y: i64) -> Option<usize> {
    [4usize, 6, 0, 2].into_iter().find(|&dir| {
        let (dx, dy) = DIRECTIONS[dir];
        !mask.get_signed(x + dx, y + dy)
    })
}

/// Follow one boundary from `start`, scanning neighbours clockwise from the
/// last background cell seen. Once moving, that cell sits 135° behind the
/// heading. `backtrack` is the direction of a background neighbour of
/// `start`. Stops on return to `start`.
fn trace_from(mask: &Mask, start: (i64, i64), backtrack: usize, visited: &mut [bool]) -> Vec<Point> {
    let width = mask.width as i64;
    let max_steps = 4 * mask.data.len();
    let mut points = vec![[start.0 as f32, start.1 as f32]];
    visited[(start.1 * width + start.0) as usize] = true;

    let (mut x, mut y) = start;
    let mut scan_start = backtrack;

    for _ in 0..max_steps {
        let next = (1..8).map(|i| (scan_start + i) % 8).find(|&dir| {
            let (dx, dy) = DIRECTIONS[dir];
            mask.get_signed(x + dx, y + dy)
        });
        let Some(dir) = next else {
            break;
        };

        // The cell scanned just before `dir` is background; re-anchor it on the new pixel
        let prev = DIRECTIONS[(dir + 7) % 8];
        let step = DIRECTIONS[dir];
        let Some(back) = direction_index((prev.0 - step.0, prev.1 - step.1)) else {
            break;
        };
        scan_start = back;

        x += step.0;
        y += step.1;
        if (x, y) == start {
            break;
        }
        visited[(y * width + x) as usize] = true;
        points.push([x as f32, y as f32]);
    }
    points
}

/// Ordered boundary polygons (pixel-centre coordinates) of every traced
/// boundary in the mask. Outer boundaries run clockwise on screen, hole
/// boundaries counter-clockwise. Traces with fewer than 3 points are dropped.
///
/// Known limitation: single-pixel-wide protrusions can close a trace early,
/// and hole boundaries that touch the outer boundary are not separated.
pub fn trace_contours(mask: &Mask) -> Vec<Vec<Point>> {
    let mut visited = vec![false; mask.data.len()];
    let mut contours = Vec::new();

    for y in 0..mask.height as i64 {
        for x in 0..mask.width as i64 {
            let idx = (y * mask.width as i64 + x) as usize;
            if visited[idx] || !mask.get_signed(x, y) {
                continue;
            }
            let Some(backtrack) = exposed_side(mask, x, y) else {
                continue;
            };
            let contour = trace_from(mask, (x, y), backtrack, &mut visited);
            if contour.len() >= 3 {
                contours.push(contour);
            }
        }
    }
    contours
}

/// Moore-neighbour tracer exposed through [`ContourExtractor`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MooreContourExtractor;

impl ContourExtractor for MooreContourExtractor {
    fn extract_contours(&self, mask: &Mask) -> Result<Vec<Vec<[f32; 2]>>> {
        Ok(trace_contours(mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(size: u32, cx: f32, cy: f32, r: f32) -> Mask {
        Mask::from_fn(size, size, |x, y| {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            dx * dx + dy * dy <= r * r
        })
    }

    #[test]
    fn test_square_trace_visits_every_boundary_pixel() {
        let mask = Mask::from_fn(10, 10, |x, y| (2..=6).contains(&x) && (2..=6).contains(&y));
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(contour.len(), 16);
        assert_eq!(contour[0], [2.0, 2.0]);
        // Clockwise on screen: heads east first
        assert_eq!(contour[1], [3.0, 2.0]);
    }

    #[test]
    fn test_two_islands_give_two_contours() {
        let mask = Mask::from_fn(20, 10, |x, y| {
            (1..=4).contains(&y) && ((1..=4).contains(&x) || (10..=15).contains(&x))
        });
        assert_eq!(trace_contours(&mask).len(), 2);
    }

    #[test]
    fn test_tiny_traces_are_dropped() {
        let mut mask = Mask::new(8, 8);
        mask.set(1, 1, true);
        mask.set(5, 5, true);
        mask.set(6, 5, true);
        assert!(trace_contours(&mask).is_empty());
    }

    #[test]
    fn test_contour_roundtrip_preserves_area() {
        let mask = disk(40, 20.0, 20.0, 9.0);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        let refilled = polygon_to_mask(&contours[0], 40, 40);
        let original = mask.pixel_count() as f32;
        let diff = (refilled.pixel_count() as f32 - original).abs();
        assert!(diff / original < 0.1, "{} vs {}", refilled.pixel_count(), original);
        assert!(refilled.is_subset_of(&mask));
    }

    #[test]
    fn test_trace_touching_image_edge() {
        let mask = Mask::filled(4, 3);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 10);
    }

    fn ring() -> Mask {
        Mask::from_fn(12, 12, |x, y| {
            let outer = (2..=9).contains(&x) && (2..=9).contains(&y);
            let hole = (5..=6).contains(&x) && (5..=6).contains(&y);
            outer && !hole
        })
    }

    #[test]
    fn test_ring_trace_has_outer_and_hole_contours() {
        let mask = ring();
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 28);
        assert_eq!(contours[1].len(), 8);

        let edge = crate::ops::inner_boundary(&mask).mask;
        for point in contours.iter().flatten() {
            assert!(
                edge.get(point[0] as u32, point[1] as u32),
                "{:?} is not a boundary pixel",
                point
            );
        }
    }

    #[test]
    fn test_hole_trace_starts_on_exposed_side() {
        let contours = trace_contours(&ring());
        let hole = &contours[1];
        // First unvisited pixel above the hole, leaving towards the hole's west side
        assert_eq!(hole[0], [5.0, 4.0]);
        assert_eq!(hole[1], [4.0, 5.0]);
    }

    #[test]
    fn test_moore_extractor_trait() {
        let mask = disk(20, 10.0, 10.0, 4.0);
        let contours = MooreContourExtractor.extract_contours(&mask).expect("Should extract");
        assert_eq!(contours, trace_contours(&mask));
    }
}
