//! Intensity-driven segmentation: range, adaptive (local window), Otsu and
//! hysteresis thresholds. Every function reads a caller intensity buffer and
//! returns a fresh mask.

pub mod adaptive;
pub mod hysteresis;
pub mod otsu;

pub use adaptive::*;
pub use hysteresis::*;
pub use otsu::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Intensity, IntensityImage, Mask, MaskOperationResult};

/// Inclusive intensity window. `lower <= upper` is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdConfig {
    pub lower_threshold: f32,
    pub upper_threshold: f32,
    /// Select everything outside the window instead
    #[serde(default)]
    pub invert: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            lower_threshold: 0.0,
            upper_threshold: 255.0,
            invert: false,
        }
    }
}

/// Summary of the intensities under a selection. All zero when nothing is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntensityStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Single-pass accumulator (sum and sum of squares).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAccumulator {
    count: usize,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

impl StatsAccumulator {
    #[inline]
    pub fn push(&mut self, value: f32) {
        let v = value as f64;
        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    pub fn finish(&self) -> IntensityStats {
        if self.count == 0 {
            return IntensityStats::default();
        }
        let n = self.count as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);
        IntensityStats {
            count: self.count,
            mean,
            std: variance.sqrt(),
            min: self.min,
            max: self.max,
        }
    }
}

/// Statistics of `image` under the set pixels of `mask`
pub fn masked_statistics<T: Intensity>(image: &IntensityImage<'_, T>, mask: &Mask) -> IntensityStats {
    let mut acc = StatsAccumulator::default();
    for (v, &m) in image.values().zip(&mask.data) {
        if m != 0 {
            acc.push(v);
        }
    }
    acc.finish()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub segmentation: MaskOperationResult,
    pub statistics: IntensityStats,
}

/// Select pixels with `lower <= intensity <= upper` (or the complement when
/// inverted) while accumulating statistics over the selection.
pub fn threshold_segment<T: Intensity>(
    image: &IntensityImage<'_, T>,
    config: &ThresholdConfig,
) -> ThresholdResult {
    if config.lower_threshold > config.upper_threshold {
        warn!(
            lower = config.lower_threshold,
            upper = config.upper_threshold,
            "threshold window is inverted, selection will be empty unless invert is set"
        );
    }

    let mut acc = StatsAccumulator::default();
    let data = image
        .values()
        .map(|v| {
            let inside = v >= config.lower_threshold && v <= config.upper_threshold;
            let selected = inside != config.invert;
            if selected {
                acc.push(v);
            }
            selected as u8
        })
        .collect();

    let mask = Mask {
        width: image.width,
        height: image.height,
        data,
    };
    ThresholdResult {
        segmentation: mask.into(),
        statistics: acc.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_ramp() -> Vec<u16> {
        (0..16u16).flat_map(|_| (0..16u16).map(|x| x * 16)).collect()
    }

    #[test]
    fn test_threshold_selects_columns_in_range() {
        let data = column_ramp();
        let image = IntensityImage::new(&data, 16, 16).expect("Should wrap buffer");
        let config = ThresholdConfig {
            lower_threshold: 100.0,
            upper_threshold: 200.0,
            invert: false,
        };
        let result = threshold_segment(&image, &config);

        // Columns 7..=12 hold 112..=192
        assert_eq!(result.segmentation.pixel_count, 6 * 16);
        for x in 0..16 {
            let expected = (7..=12).contains(&x);
            assert_eq!(result.segmentation.mask.get(x, 5), expected, "column {x}");
        }
        assert_eq!(result.statistics.min, 112.0);
        assert_eq!(result.statistics.max, 192.0);
        assert!((result.statistics.mean - 152.0).abs() < 1e-9);
        assert_eq!(result.segmentation.bounds.min_x, 7);
        assert_eq!(result.segmentation.bounds.max_x, 12);
    }

    #[test]
    fn test_inverted_threshold_selects_complement() {
        let data = column_ramp();
        let image = IntensityImage::new(&data, 16, 16).expect("Should wrap buffer");
        let config = ThresholdConfig {
            lower_threshold: 100.0,
            upper_threshold: 200.0,
            invert: true,
        };
        let result = threshold_segment(&image, &config);
        assert_eq!(result.segmentation.pixel_count, 10 * 16);
        assert_eq!(result.statistics.min, 0.0);
        assert_eq!(result.statistics.max, 240.0);
    }

    #[test]
    fn test_empty_selection_has_zeroed_stats() {
        let data = vec![10.0f32; 9];
        let image = IntensityImage::new(&data, 3, 3).expect("Should wrap buffer");
        let config = ThresholdConfig {
            lower_threshold: 50.0,
            upper_threshold: 60.0,
            invert: false,
        };
        let result = threshold_segment(&image, &config);
        assert_eq!(result.segmentation.pixel_count, 0);
        assert_eq!(result.statistics, IntensityStats::default());
        assert!(!result.statistics.mean.is_nan());
    }

    #[test]
    fn test_std_of_two_values() {
        let mut acc = StatsAccumulator::default();
        acc.push(2.0);
        acc.push(4.0);
        let stats = acc.finish();
        assert_eq!(stats.mean, 3.0);
        assert!((stats.std - 1.0).abs() < 1e-12);
    }
}
