use crate::types::{Mask, Point};

/// Scanline polygon fill. For each row, edge crossings are sorted and the
/// inclusive spans between successive pairs are set. Fewer than three
/// vertices yields an empty mask.
pub fn polygon_to_mask(polygon: &[Point], width: u32, height: u32) -> Mask {
    let mut mask = Mask::new(width, height);
    fill_polygon_into(&mut mask, polygon);
    mask
}

pub(crate) fn fill_polygon_into(mask: &mut Mask, polygon: &[Point]) {
    if polygon.len() < 3 || mask.width == 0 || mask.height == 0 {
        return;
    }

    let (min_y, max_y) = polygon
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
    let first_row = min_y.ceil().max(0.0) as u32;
    let last_row = max_y.floor().min(mask.height as f32 - 1.0);
    if last_row < 0.0 {
        return;
    }
    let last_row = last_row as u32;

    let mut crossings: Vec<f32> = Vec::new();
    for row in first_row..=last_row {
        let y = row as f32;
        crossings.clear();
        for (i, a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            let (y0, y1) = (a[1], b[1]);
            if (y0 <= y && y1 > y) || (y1 <= y && y0 > y) {
                let t = (y - y0) / (y1 - y0);
                crossings.push(a[0] + t * (b[0] - a[0]));
            }
        }
        crossings.sort_by(f32::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let start = pair[0].ceil().max(0.0);
            let end = pair[1].floor().min(mask.width as f32 - 1.0);
            if end < start {
                continue;
            }
            for x in start as u32..=end as u32 {
                mask.set(x, row, true);
            }
        }
    }
}

/// Rasterize the closed outline of a polygon (Bresenham segments, last
/// vertex joined to the first). Fewer than three vertices yields an empty mask.
pub fn polygon_outline_to_mask(polygon: &[Point], width: u32, height: u32) -> Mask {
    let mut mask = Mask::new(width, height);
    draw_outline_into(&mut mask, polygon);
    mask
}

pub(crate) fn draw_outline_into(mask: &mut Mask, polygon: &[Point]) {
    if polygon.len() < 3 {
        return;
    }
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        draw_line(mask, *a, b);
    }
}

fn draw_line(mask: &mut Mask, from: Point, to: Point) {
    let (mut x0, mut y0) = (from[0].round() as i64, from[1].round() as i64);
    let (x1, y1) = (to[0].round() as i64, to[1].round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if mask.contains_point(x0, y0) {
            mask.set(x0 as u32, y0 as u32, true);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_polygon_is_empty() {
        assert!(polygon_to_mask(&[[1.0, 1.0], [5.0, 5.0]], 10, 10).is_blank());
        assert!(polygon_to_mask(&[], 10, 10).is_blank());
        assert!(polygon_outline_to_mask(&[[1.0, 1.0], [5.0, 1.0]], 10, 10).is_blank());
    }

    #[test]
    fn test_rectangle_fill() {
        let rect = [[2.0, 2.0], [8.0, 2.0], [8.0, 6.0], [2.0, 6.0]];
        let mask = polygon_to_mask(&rect, 12, 12);
        // Rows 2..=5 (half-open in y), columns 2..=8 inclusive
        assert_eq!(mask.pixel_count(), 4 * 7);
        assert!(mask.get(2, 2));
        assert!(mask.get(8, 5));
        assert!(!mask.get(5, 6));
    }

    #[test]
    fn test_triangle_fill_is_symmetric() {
        let triangle = [[10.0, 2.0], [18.0, 18.0], [2.0, 18.0]];
        let mask = polygon_to_mask(&triangle, 21, 21);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(mask.get(x, y), mask.get(20 - x, y), "({x}, {y})");
            }
        }
        assert!(mask.get(10, 10));
        assert!(!mask.get(3, 5));
    }

    #[test]
    fn test_polygon_is_clipped_to_raster() {
        let big = [[-5.0, -5.0], [50.0, -5.0], [50.0, 50.0], [-5.0, 50.0]];
        assert_eq!(polygon_to_mask(&big, 8, 6).pixel_count(), 48);
    }

    #[test]
    fn test_concave_polygon_leaves_notch() {
        // U shape opening upward
        let u = [
            [1.0, 1.0], [3.0, 1.0], [3.0, 7.0], [7.0, 7.0],
            [7.0, 1.0], [9.0, 1.0], [9.0, 9.0], [1.0, 9.0],
        ];
        let mask = polygon_to_mask(&u, 11, 11);
        assert!(mask.get(2, 4));
        assert!(mask.get(8, 4));
        assert!(!mask.get(5, 4));
        assert!(mask.get(5, 8));
    }

    #[test]
    fn test_outline_of_square() {
        let square = [[1.0, 1.0], [5.0, 1.0], [5.0, 5.0], [1.0, 5.0]];
        let mask = polygon_outline_to_mask(&square, 8, 8);
        assert_eq!(mask.pixel_count(), 16);
        assert!(!mask.get(3, 3));
        assert!(mask.get(5, 3));
    }
}
