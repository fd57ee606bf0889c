use tracing::debug;

use crate::{
    brush::{Brush3DConfig, BrushConfig, BrushKernel},
    types::{Mask, MaskOperationResult, Point},
};

/// A kernel cell is committed when `value * opacity` reaches this.
pub const COMMIT_THRESHOLD: f32 = 0.5;

/// Stroke points that receive a stamp: the first point, then each point at
/// least `min_distance` from the previous stamp. Closer points are skipped.
pub fn stamp_positions(points: &[Point], min_distance: f32) -> Vec<Point> {
    let mut stamps: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        let keep = match stamps.last() {
            None => true,
            Some(last) => {
                let (dx, dy) = (point[0] - last[0], point[1] - last[1]);
                (dx * dx + dy * dy).sqrt() >= min_distance
            }
        };
        if keep {
            stamps.push(point);
        }
    }
    stamps
}

/// Stamp `kernel` centred on `center` into `mask` in place.
pub(crate) fn stamp_kernel(mask: &mut Mask, kernel: &BrushKernel, center: Point, opacity: f32, erase: bool) {
    let cx = center[0].round() as i64;
    let cy = center[1].round() as i64;
    for (dx, dy, value) in kernel.cells() {
        let (x, y) = (cx + dx, cy + dy);
        if !mask.contains_point(x, y) {
            continue;
        }
        if value * opacity >= COMMIT_THRESHOLD {
            mask.set(x as u32, y as u32, !erase);
        }
    }
}

/// One brush stamp on a copy of `mask`
pub fn brush_stamp(mask: &Mask, center: Point, config: &BrushConfig) -> MaskOperationResult {
    let kernel = BrushKernel::new(config);
    let mut out = mask.clone();
    stamp_kernel(&mut out, &kernel, center, config.opacity, config.is_eraser);
    out.into()
}

fn stroke_into(mask: &mut Mask, kernel: &BrushKernel, stamps: &[Point], opacity: f32, erase: bool) {
    for &point in stamps {
        stamp_kernel(mask, kernel, point, opacity, erase);
    }
}

/// Paint (or erase) a stroke into a copy of `mask`.
pub fn apply_stroke(mask: &Mask, points: &[Point], config: &BrushConfig) -> MaskOperationResult {
    let kernel = BrushKernel::new(config);
    let stamps = stamp_positions(points, config.min_stamp_distance());
    let mut out = mask.clone();
    stroke_into(&mut out, &kernel, &stamps, config.opacity, config.is_eraser);
    out.into()
}

/// Apply a stroke drawn on slice `current` to every slice within half the
/// brush depth, scaling opacity by the depth falloff. Slices outside that
/// range are returned unchanged.
pub fn apply_stroke_3d(
    slices: &[Mask],
    current: usize,
    points: &[Point],
    config: &Brush3DConfig,
) -> Vec<Mask> {
    let half_depth = config.half_depth();
    let kernel = BrushKernel::new(&config.brush);
    let stamps = stamp_positions(points, config.brush.min_stamp_distance());
    let first = current.saturating_sub(half_depth as usize);
    let last = current + half_depth as usize;

    let out: Vec<Mask> = slices
        .iter()
        .enumerate()
        .map(|(z, slice)| {
            if z < first || z > last {
                return slice.clone();
            }
            let dz = z as i64 - current as i64;
            let opacity = config.brush.opacity * config.depth_falloff.factor(dz, half_depth);
            let mut painted = slice.clone();
            stroke_into(&mut painted, &kernel, &stamps, opacity, config.brush.is_eraser);
            painted
        })
        .collect();

    debug!(
        current,
        first,
        last = last.min(slices.len().saturating_sub(1)),
        stamps = stamps.len(),
        "3d brush stroke"
    );
    out
}

/// Hard filled disk of `radius` at every point, ignoring stamp spacing.
pub(crate) fn paint_disks(mask: &mut Mask, points: &[Point], radius: f32) {
    let kernel = BrushKernel::new(&BrushConfig {
        radius,
        hardness: 1.0,
        opacity: 1.0,
        ..Default::default()
    });
    stroke_into(mask, &kernel, points, 1.0, false);
}
