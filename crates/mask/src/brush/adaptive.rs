use crate::{
    brush::{stamp_positions, AdaptiveBrushConfig, BrushKernel},
    error::{MaskError, Result},
    types::{Intensity, IntensityImage, Mask, MaskOperationResult, Point},
};

/// Blended cell strength needed before opacity is considered.
pub const ADAPTIVE_VALUE_THRESHOLD: f32 = 0.3;
/// Opacity needed for any adaptive cell to commit.
pub const ADAPTIVE_OPACITY_THRESHOLD: f32 = 0.5;

/// 1 inside the tolerance band, then linear decay to 0 over one more band width.
#[inline]
fn linear_decay(excess: f32, band: f32) -> f32 {
    if excess <= 0.0 {
        return 1.0;
    }
    (1.0 - excess / band.max(1.0)).max(0.0)
}

/// Edge-aware brush. Each kernel cell is weighted by how close its intensity
/// is to the intensity under the stamp centre and by how weak the local
/// Sobel gradient is, so strokes stop at tissue boundaries.
pub fn apply_adaptive_stroke<T: Intensity>(
    mask: &Mask,
    image: &IntensityImage<'_, T>,
    points: &[Point],
    config: &AdaptiveBrushConfig,
) -> Result<MaskOperationResult> {
    if mask.dimensions() != image.dimensions() {
        return Err(MaskError::DimensionMismatch {
            expected: mask.dimensions(),
            actual: image.dimensions(),
        });
    }

    let brush = &config.brush;
    let kernel = BrushKernel::new(brush);
    let stamps = stamp_positions(points, brush.min_stamp_distance());
    let edge_strength = if config.edge_snapping {
        config.edge_strength.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut out = mask.clone();

    if brush.opacity < ADAPTIVE_OPACITY_THRESHOLD || out.data.is_empty() {
        return Ok(out.into());
    }

    for center in stamps {
        let cx = center[0].round() as i64;
        let cy = center[1].round() as i64;
        // Stamps hanging off the edge compare against the nearest edge sample
        let reference = image.value_clamped(cx, cy);

        for (dx, dy, falloff) in kernel.cells() {
            let (x, y) = (cx + dx, cy + dy);
            if !out.contains_point(x, y) {
                continue;
            }
            let intensity = image.value(x as u32, y as u32);
            let intensity_factor = linear_decay(
                (intensity - reference).abs() - config.intensity_tolerance,
                config.intensity_tolerance,
            );
            let edge_factor = if edge_strength > 0.0 {
                let gradient = image.sobel_magnitude(x, y);
                linear_decay(gradient - config.gradient_threshold, config.gradient_threshold)
            } else {
                1.0
            };
            let blended = intensity_factor * (1.0 - edge_strength) + edge_factor * edge_strength;
            if blended * falloff >= ADAPTIVE_VALUE_THRESHOLD {
                out.set(x as u32, y as u32, !brush.is_eraser);
            }
        }
    }

    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushConfig;

    /// Dark left half (20), bright right half (200), split at x = 10.
    fn two_tone() -> Vec<f32> {
        (0..20)
            .flat_map(|_| (0..20).map(|x| if x < 10 { 20.0 } else { 200.0 }))
            .collect()
    }

    fn config(edge_snapping: bool, edge_strength: f32) -> AdaptiveBrushConfig {
        AdaptiveBrushConfig {
            brush: BrushConfig {
                radius: 6.0,
                ..Default::default()
            },
            intensity_tolerance: 15.0,
            gradient_threshold: 40.0,
            edge_snapping,
            edge_strength,
        }
    }

    #[test]
    fn test_adaptive_brush_stays_on_similar_tissue() {
        let data = two_tone();
        let image = IntensityImage::new(&data, 20, 20).expect("Should wrap buffer");
        let result = apply_adaptive_stroke(&Mask::new(20, 20), &image, &[[6.0, 10.0]], &config(false, 0.0))
            .expect("Should paint");
        assert!(result.mask.get(6, 10));
        assert!(result.mask.get(9, 10));
        assert!(!result.mask.get(10, 10), "bright side must not be painted");
        assert!(!result.mask.get(12, 10));
    }

    #[test]
    fn test_uniform_region_paints_full_disk() {
        let data = vec![20.0f32; 400];
        let image = IntensityImage::new(&data, 20, 20).expect("Should wrap buffer");
        let result = apply_adaptive_stroke(&Mask::new(20, 20), &image, &[[6.0, 10.0]], &config(true, 0.5))
            .expect("Should paint");
        assert!(result.mask.get(12, 10));
    }

    #[test]
    fn test_edge_snapping_blocks_strong_gradient() {
        let data = two_tone();
        let image = IntensityImage::new(&data, 20, 20).expect("Should wrap buffer");
        // Pure edge weighting: cells on the boundary columns have a large Sobel response
        let result = apply_adaptive_stroke(&Mask::new(20, 20), &image, &[[6.0, 10.0]], &config(true, 1.0))
            .expect("Should paint");
        assert!(result.mask.get(6, 10));
        assert!(!result.mask.get(9, 10));
        assert!(!result.mask.get(10, 10));
    }

    #[test]
    fn test_dimension_mismatch() {
        let data = vec![0u8; 16];
        let image = IntensityImage::new(&data, 4, 4).expect("Should wrap buffer");
        let err = apply_adaptive_stroke(&Mask::new(5, 4), &image, &[], &config(true, 0.5));
        assert!(matches!(err, Err(MaskError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_stamp_centred_off_image_paints_inside_part() {
        let data = vec![20.0f32; 400];
        let image = IntensityImage::new(&data, 20, 20).expect("Should wrap buffer");
        let result = apply_adaptive_stroke(&Mask::new(20, 20), &image, &[[-2.0, 10.0]], &config(false, 0.0))
            .expect("Should paint");
        let plain = crate::brush::brush_stamp(&Mask::new(20, 20), [-2.0, 10.0], &config(false, 0.0).brush);
        assert!(result.mask.get(0, 10));
        assert!(result.mask.get(2, 10));
        assert!(!result.mask.get(6, 10));
        assert!(plain.mask.get(0, 10));
    }
}
