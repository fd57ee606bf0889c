use std::collections::HashSet;

use geo::{Area, Contains, Simplify};
use geo_types::{Coord, LineString, Polygon};
use imageproc::contours::{find_contours, BorderType};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    traits::{ContourExtractor, HoleDetector},
    types::{Mask, Point},
};

/// Outlines of every shape found in a mask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputedOutline {
    pub shapes: Vec<ComplexShape>,
    pub image_width: u32,
    pub image_height: u32,
}

/// An exterior ring plus the rings of its holes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexShape {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

fn to_line_string(points: &[Point]) -> LineString<f32> {
    LineString::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
}

fn from_line_string(line: &LineString<f32>) -> Vec<Point> {
    line.coords().map(|c| [c.x, c.y]).collect()
}

impl ComplexShape {
    pub fn to_geo_polygon(&self) -> Polygon<f32> {
        Polygon::new(
            to_line_string(&self.exterior),
            self.holes.iter().map(|hole| to_line_string(hole)).collect(),
        )
    }

    /// Polygon area (exterior minus holes) in square pixels
    pub fn area(&self) -> f32 {
        self.to_geo_polygon().unsigned_area()
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Rasterize back to a mask: exterior filled, holes cleared
    pub fn to_mask(&self, width: u32, height: u32) -> Mask {
        let mut mask = super::polygon_to_mask(&self.exterior, width, height);
        for hole in &self.holes {
            let cut = super::polygon_to_mask(hole, width, height);
            for (m, c) in mask.data.iter_mut().zip(&cut.data) {
                if *c != 0 {
                    *m = 0;
                }
            }
        }
        mask
    }
}

/// Douglas-Peucker simplification of a ring. The ring is closed for the
/// simplification and returned without the repeated closing point.
pub fn simplify_contour(points: &[Point], tolerance: f32) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut ring = to_line_string(points);
    ring.close();
    let mut simplified = from_line_string(&ring.simplify(&tolerance));
    if simplified.len() > 1 && simplified.first() == simplified.last() {
        simplified.pop();
    }
    simplified
}

/// Suzuki–Abe border following from `imageproc`; returns outer borders and
/// hole borders alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, mask: &Mask) -> Result<Vec<Vec<[f32; 2]>>> {
        let contours = find_contours::<i32>(&mask.to_gray_image());
        Ok(contours
            .into_iter()
            .map(|contour| contour.points.iter().map(|p| [p.x as f32, p.y as f32]).collect())
            .collect())
    }
}

/// Shapes with holes using the border hierarchy reported by `imageproc`:
/// every hole border is attached to its parent outer border.
pub fn extract_shapes(mask: &Mask) -> Vec<ComplexShape> {
    let contours = find_contours::<i32>(&mask.to_gray_image());
    let ring = |i: usize| -> Vec<Point> {
        contours[i].points.iter().map(|p| [p.x as f32, p.y as f32]).collect()
    };

    let mut shapes: Vec<(usize, ComplexShape)> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| c.border_type == BorderType::Outer)
        .map(|(i, _)| {
            (
                i,
                ComplexShape {
                    exterior: ring(i),
                    holes: Vec::new(),
                },
            )
        })
        .collect();

    for (i, contour) in contours.iter().enumerate() {
        if contour.border_type != BorderType::Hole {
            continue;
        }
        let Some(parent) = contour.parent else {
            continue;
        };
        if let Some((_, shape)) = shapes.iter_mut().find(|(idx, _)| *idx == parent) {
            shape.holes.push(ring(i));
        }
    }

    shapes.into_iter().map(|(_, shape)| shape).collect()
}

/// Groups rings by geometric containment: larger rings claim the rings they
/// contain as holes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentHoleDetector;

impl HoleDetector for ContainmentHoleDetector {
    fn detect_holes(&self, contours: Vec<Vec<[f32; 2]>>) -> Result<Vec<ComplexShape>> {
        let mut polygons: Vec<(Polygon<f32>, Vec<Point>)> = contours
            .into_iter()
            .filter(|points| points.len() >= 3)
            .map(|points| (Polygon::new(to_line_string(&points), vec![]), points))
            .collect();
        polygons.sort_by(|a, b| b.0.unsigned_area().total_cmp(&a.0.unsigned_area()));

        let mut shapes = Vec::new();
        let mut used = HashSet::new();
        for (i, (outer, outer_points)) in polygons.iter().enumerate() {
            if !used.insert(i) {
                continue;
            }
            let mut holes = Vec::new();
            for (j, (inner, inner_points)) in polygons.iter().enumerate() {
                if used.contains(&j) {
                    continue;
                }
                if outer.contains(inner) {
                    holes.push(inner_points.clone());
                    used.insert(j);
                }
            }
            shapes.push(ComplexShape {
                exterior: outer_points.clone(),
                holes,
            });
        }
        Ok(shapes)
    }
}

/// Every ring becomes its own shape
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHoleDetector;

impl HoleDetector for NoHoleDetector {
    fn detect_holes(&self, contours: Vec<Vec<[f32; 2]>>) -> Result<Vec<ComplexShape>> {
        Ok(contours
            .into_iter()
            .map(|exterior| ComplexShape {
                exterior,
                holes: Vec::new(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donut() -> Mask {
        Mask::from_fn(30, 30, |x, y| {
            let (dx, dy) = (x as f32 - 15.0, y as f32 - 15.0);
            let d2 = dx * dx + dy * dy;
            d2 <= 100.0 && d2 > 16.0
        })
    }

    #[test]
    fn test_extract_shapes_finds_hole() {
        let shapes = extract_shapes(&donut());
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].has_holes());
        assert_eq!(shapes[0].holes.len(), 1);
    }

    #[test]
    fn test_containment_detector_groups_rings() {
        let contours = ImageprocContourExtractor
            .extract_contours(&donut())
            .expect("Should extract");
        assert_eq!(contours.len(), 2);
        let shapes = ContainmentHoleDetector.detect_holes(contours).expect("Should group");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes.len(), 1);
    }

    #[test]
    fn test_no_hole_detector_keeps_rings_separate() {
        let contours = ImageprocContourExtractor
            .extract_contours(&donut())
            .expect("Should extract");
        let shapes = NoHoleDetector.detect_holes(contours).expect("Should wrap");
        assert_eq!(shapes.len(), 2);
    }

    #[test]
    fn test_shape_to_mask_clears_hole() {
        let mask = donut();
        let shapes = extract_shapes(&mask);
        let rebuilt = shapes[0].to_mask(30, 30);
        assert!(!rebuilt.get(15, 15));
        assert!(rebuilt.get(15, 7));
    }

    #[test]
    fn test_simplify_square_ring() {
        let ring: Vec<Point> = (0..=10)
            .map(|x| [x as f32, 0.0])
            .chain((1..=10).map(|y| [10.0, y as f32]))
            .collect();
        let simplified = simplify_contour(&ring, 0.5);
        assert_eq!(simplified, vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]]);
    }
}
