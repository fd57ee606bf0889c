use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{MaskError, Result},
    types::{Intensity, IntensityImage, Mask, MaskOperationResult},
};

pub const DEFAULT_HISTOGRAM_BINS: usize = 256;

/// Fixed-width histogram spanning the image's own intensity range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub min: f32,
    pub max: f32,
    pub bin_width: f32,
}

impl Histogram {
    pub fn build<T: Intensity>(image: &IntensityImage<'_, T>, bins: usize) -> Self {
        let bins = bins.max(2);
        let (min, max) = image.min_max().unwrap_or((0.0, 0.0));
        let bin_width = (max - min) / bins as f32;
        let mut histogram = Self {
            counts: vec![0; bins],
            min,
            max,
            bin_width,
        };
        for v in image.values() {
            let bin = histogram.bin_of(v);
            histogram.counts[bin] += 1;
        }
        histogram
    }

    #[inline]
    pub fn bin_of(&self, value: f32) -> usize {
        if self.bin_width <= 0.0 {
            return 0;
        }
        let bin = ((value - self.min) / self.bin_width).floor();
        (bin.max(0.0) as usize).min(self.counts.len() - 1)
    }

    /// Lower edge of `bin` in intensity units
    pub fn edge(&self, bin: usize) -> f32 {
        self.min + bin as f32 * self.bin_width
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OtsuResult {
    /// Intensities above this value belong to the foreground class
    pub threshold: f32,
    /// Last histogram bin of the background class
    pub bin: usize,
    pub between_class_variance: f64,
}

/// Pick the bin maximising `w0 * w1 * (mu0 - mu1)^2`. The scan uses a strict
/// comparison, so ties resolve to the lowest bin.
pub fn otsu_from_histogram(histogram: &Histogram) -> OtsuResult {
    let total = histogram.total() as f64;
    let sum_total: f64 = histogram
        .counts
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_bg = 0.0;
    let mut sum_bg = 0.0;
    let mut best_variance = 0.0;
    let mut best_bin = 0;

    for (t, &count) in histogram.counts.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += t as f64 * count as f64;

        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_total - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = t;
        }
    }

    OtsuResult {
        threshold: histogram.edge(best_bin + 1).min(histogram.max),
        bin: best_bin,
        between_class_variance: best_variance,
    }
}

pub fn otsu_threshold<T: Intensity>(image: &IntensityImage<'_, T>, bins: usize) -> OtsuResult {
    let histogram = Histogram::build(image, bins);
    let result = otsu_from_histogram(&histogram);
    debug!(bin = result.bin, threshold = result.threshold, "otsu threshold");
    result
}

/// Otsu threshold plus the foreground mask (pixels binned above the cut).
pub fn otsu_segment<T: Intensity>(
    image: &IntensityImage<'_, T>,
    bins: usize,
) -> (OtsuResult, MaskOperationResult) {
    let histogram = Histogram::build(image, bins);
    let otsu = otsu_from_histogram(&histogram);
    let data = image
        .values()
        .map(|v| (histogram.bin_of(v) > otsu.bin) as u8)
        .collect();
    let mask = Mask {
        width: image.width,
        height: image.height,
        data,
    };
    (otsu, mask.into())
}

/// First bin of each class above the lowest one.
///
/// Two classes use the Otsu optimum. Three and four classes place the cuts
/// at evenly spaced histogram positions; this is an approximation, not a
/// variance-optimal multi-level Otsu.
fn class_cuts(histogram: &Histogram, num_classes: usize) -> Result<Vec<usize>> {
    match num_classes {
        2 => Ok(vec![otsu_from_histogram(histogram).bin + 1]),
        3 | 4 => {
            let bins = histogram.counts.len();
            Ok((1..num_classes).map(|i| i * bins / num_classes).collect())
        }
        _ => Err(MaskError::InvalidArgument(format!(
            "multi-Otsu supports 2 to 4 classes, got {num_classes}"
        ))),
    }
}

/// `num_classes - 1` ascending intensity thresholds.
pub fn multi_otsu_thresholds<T: Intensity>(
    image: &IntensityImage<'_, T>,
    num_classes: usize,
    bins: usize,
) -> Result<Vec<f32>> {
    let histogram = Histogram::build(image, bins);
    let cuts = class_cuts(&histogram, num_classes)?;
    Ok(cuts.into_iter().map(|cut| histogram.edge(cut)).collect())
}

/// Class index (0..num_classes) per pixel, using the same cuts as
/// [`multi_otsu_thresholds`].
pub fn multi_otsu_labels<T: Intensity>(
    image: &IntensityImage<'_, T>,
    num_classes: usize,
    bins: usize,
) -> Result<Vec<u8>> {
    let histogram = Histogram::build(image, bins);
    let cuts = class_cuts(&histogram, num_classes)?;
    Ok(image
        .values()
        .map(|v| {
            let bin = histogram.bin_of(v);
            cuts.iter().filter(|&&cut| bin >= cut).count() as u8
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangular clusters centred on 50 and 200 with equal weight,
    /// each spanning 74 intensity levels either side.
    fn bimodal() -> Vec<f32> {
        let mut data = Vec::new();
        for centre in [50i32, 200] {
            for offset in -74i32..=74 {
                let weight = 75 - offset.abs();
                for _ in 0..weight {
                    data.push((centre + offset) as f32);
                }
            }
        }
        data
    }

    #[test]
    fn test_otsu_bimodal_splits_between_clusters() {
        let data = bimodal();
        let image = IntensityImage::new(&data, data.len() as u32, 1).expect("Should wrap buffer");
        let result = otsu_threshold(&image, DEFAULT_HISTOGRAM_BINS);
        let histogram = Histogram::build(&image, DEFAULT_HISTOGRAM_BINS);
        let bins_from_midpoint = ((result.threshold - 125.0) / histogram.bin_width).abs();
        assert!(
            bins_from_midpoint <= 3.0,
            "threshold {} should be within a few bins of 125",
            result.threshold
        );
    }

    #[test]
    fn test_otsu_segment_separates_clusters() {
        let data = bimodal();
        let image = IntensityImage::new(&data, data.len() as u32, 1).expect("Should wrap buffer");
        let (_, result) = otsu_segment(&image, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(result.pixel_count, data.len() / 2);
    }

    #[test]
    fn test_otsu_ties_resolve_to_lowest_bin() {
        // Two spikes: every cut between them scores the same
        let data = [10.0f32, 10.0, 90.0, 90.0];
        let image = IntensityImage::new(&data, 4, 1).expect("Should wrap buffer");
        let result = otsu_threshold(&image, 8);
        assert_eq!(result.bin, 0);
        assert_eq!(result.threshold, 20.0);
    }

    #[test]
    fn test_otsu_constant_image() {
        let data = vec![42u8; 16];
        let image = IntensityImage::new(&data, 4, 4).expect("Should wrap buffer");
        let (result, mask) = otsu_segment(&image, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(result.threshold, 42.0);
        assert_eq!(mask.pixel_count, 0);
    }

    #[test]
    fn test_multi_otsu_class_bounds() {
        let data: Vec<u8> = (0..=255).collect();
        let image = IntensityImage::new(&data, 256, 1).expect("Should wrap buffer");
        assert!(matches!(
            multi_otsu_thresholds(&image, 1, 256),
            Err(MaskError::InvalidArgument(_))
        ));
        assert!(multi_otsu_thresholds(&image, 5, 256).is_err());
    }

    #[test]
    fn test_multi_otsu_even_spacing() {
        let data: Vec<u8> = (0..=255).collect();
        let image = IntensityImage::new(&data, 256, 1).expect("Should wrap buffer");
        let thresholds = multi_otsu_thresholds(&image, 4, 256).expect("Should compute");
        assert_eq!(thresholds.len(), 3);
        let width = 255.0 / 256.0;
        for (i, t) in thresholds.iter().enumerate() {
            assert!((t - (64 * (i + 1)) as f32 * width).abs() < 1e-3);
        }

        let labels = multi_otsu_labels(&image, 4, 256).expect("Should label");
        assert_eq!(labels[0], 0);
        assert_eq!(labels[100], 1);
        assert_eq!(labels[255], 3);
    }

    #[test]
    fn test_multi_otsu_two_classes_matches_otsu() {
        let data = bimodal();
        let image = IntensityImage::new(&data, data.len() as u32, 1).expect("Should wrap buffer");
        let thresholds = multi_otsu_thresholds(&image, 2, 256).expect("Should compute");
        assert_eq!(thresholds, vec![otsu_threshold(&image, 256).threshold]);
    }
}
