//! Area, perimeter, shape and volume statistics over masks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::{Bounds, Mask, Point};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MeasurementUnit {
    #[default]
    Pixel,
    Millimeter,
}

/// Physical size of one pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PixelSpacing {
    pub x: f64,
    pub y: f64,
    pub unit: MeasurementUnit,
}

impl Default for PixelSpacing {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            unit: MeasurementUnit::Pixel,
        }
    }
}

impl PixelSpacing {
    pub fn millimeters(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            unit: MeasurementUnit::Millimeter,
        }
    }

    pub fn pixel_area(&self) -> f64 {
        self.x * self.y
    }
}

/// Shape statistics for one mask. Lengths and areas are in `unit`; the
/// centroid stays in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MaskMeasurements {
    pub pixel_count: usize,
    pub area: f64,
    pub perimeter: f64,
    pub centroid: [f64; 2],
    pub bounds: Bounds,
    pub circularity: f64,
    pub solidity: f64,
    pub convex_hull_area: f64,
    pub unit: MeasurementUnit,
}

/// Exposed faces of set pixels as `(vertical, horizontal)` counts. A
/// vertical face separates a pixel from its left or right neighbour.
fn exposed_faces(mask: &Mask) -> (u64, u64) {
    let mut vertical = 0;
    let mut horizontal = 0;
    for (x, y) in mask.set_pixels() {
        let (x, y) = (x as i64, y as i64);
        vertical += !mask.get_signed(x - 1, y) as u64 + !mask.get_signed(x + 1, y) as u64;
        horizontal += !mask.get_signed(x, y - 1) as u64 + !mask.get_signed(x, y + 1) as u64;
    }
    (vertical, horizontal)
}

fn is_edge_pixel(mask: &Mask, x: i64, y: i64) -> bool {
    !mask.get_signed(x - 1, y)
        || !mask.get_signed(x + 1, y)
        || !mask.get_signed(x, y - 1)
        || !mask.get_signed(x, y + 1)
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a[0] as f64 - o[0] as f64) * (b[1] as f64 - o[1] as f64)
        - (a[1] as f64 - o[1] as f64) * (b[0] as f64 - o[0] as f64)
}

fn distance_sq(a: Point, b: Point) -> f64 {
    let (dx, dy) = (a[0] as f64 - b[0] as f64, a[1] as f64 - b[1] as f64);
    dx * dx + dy * dy
}

/// Graham scan. Collinear points are dropped; fewer than three distinct
/// points are returned as-is.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut points = points.to_vec();
    points.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let pivot_idx = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a[1].total_cmp(&b[1]).then(a[0].total_cmp(&b[0])))
        .map(|(i, _)| i)
        .unwrap_or(0);
    points.swap(0, pivot_idx);
    let pivot = points[0];

    points[1..].sort_by(|a, b| {
        let turn = cross(pivot, *a, *b);
        if turn > 0.0 {
            std::cmp::Ordering::Less
        } else if turn < 0.0 {
            std::cmp::Ordering::Greater
        } else {
            distance_sq(pivot, *a).total_cmp(&distance_sq(pivot, *b))
        }
    });

    let mut hull: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], point) <= 0.0 {
            hull.pop();
        }
        hull.push(point);
    }
    hull
}

/// Shoelace area of a simple polygon
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a[0] as f64 * b[1] as f64 - b[0] as f64 * a[1] as f64)
        .sum();
    twice.abs() / 2.0
}

/// Convex hull area in pixel units, taken over the corners of the edge
/// pixels so a filled rectangle has the same hull area as pixel area.
fn convex_hull_pixel_area(mask: &Mask) -> f64 {
    let mut corners: Vec<Point> = Vec::new();
    for (x, y) in mask.set_pixels() {
        if !is_edge_pixel(mask, x as i64, y as i64) {
            continue;
        }
        let (x, y) = (x as f32, y as f32);
        corners.extend([[x, y], [x + 1.0, y], [x, y + 1.0], [x + 1.0, y + 1.0]]);
    }
    polygon_area(&convex_hull(&corners))
}

pub fn measure_mask(mask: &Mask, spacing: &PixelSpacing) -> MaskMeasurements {
    let pixel_count = mask.pixel_count();
    let area = pixel_count as f64 * spacing.pixel_area();
    let (vertical, horizontal) = exposed_faces(mask);
    let perimeter = vertical as f64 * spacing.y + horizontal as f64 * spacing.x;

    let (mut sum_x, mut sum_y) = (0.0, 0.0);
    for (x, y) in mask.set_pixels() {
        sum_x += x as f64;
        sum_y += y as f64;
    }
    let centroid = if pixel_count == 0 {
        [0.0, 0.0]
    } else {
        [sum_x / pixel_count as f64, sum_y / pixel_count as f64]
    };

    let convex_hull_area = convex_hull_pixel_area(mask) * spacing.pixel_area();
    let circularity = if perimeter > 0.0 {
        4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
    } else {
        0.0
    };
    let solidity = if convex_hull_area > 0.0 {
        area / convex_hull_area
    } else {
        0.0
    };
    let bounds = if pixel_count == 0 {
        Bounds::default()
    } else {
        mask.bounds()
    };

    MaskMeasurements {
        pixel_count,
        area,
        perimeter,
        centroid,
        bounds,
        circularity,
        solidity,
        convex_hull_area,
        unit: spacing.unit,
    }
}

/// Aggregate over a stack of equally spaced slices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeMeasurements {
    pub voxel_count: usize,
    pub volume: f64,
    pub surface_area: f64,
    pub occupied_slices: usize,
    pub unit: MeasurementUnit,
}

/// Volume is the sum of slice areas times `slice_spacing`. Surface area sums
/// each slice's perimeter times `slice_spacing` and adds the first and last
/// occupied slices' areas as caps.
pub fn measure_stack(slices: &[Mask], spacing: &PixelSpacing, slice_spacing: f64) -> VolumeMeasurements {
    let per_slice: Vec<MaskMeasurements> = slices
        .iter()
        .map(|slice| measure_mask(slice, spacing))
        .filter(|m| m.pixel_count > 0)
        .collect();

    let voxel_count = per_slice.iter().map(|m| m.pixel_count).sum();
    let volume = per_slice.iter().map(|m| m.area * slice_spacing).sum();
    let mut surface_area: f64 = per_slice.iter().map(|m| m.perimeter * slice_spacing).sum();
    if let (Some(first), Some(last)) = (per_slice.first(), per_slice.last()) {
        surface_area += first.area + last.area;
    }

    VolumeMeasurements {
        voxel_count,
        volume,
        surface_area,
        occupied_slices: per_slice.len(),
        unit: spacing.unit,
    }
}
