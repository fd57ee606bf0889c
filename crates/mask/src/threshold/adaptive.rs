use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::{Intensity, IntensityImage, Mask, MaskOperationResult};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdaptiveMethod {
    /// Threshold at `local_mean - constant`
    #[default]
    Mean,
    /// Threshold at `local_mean - constant * local_std * 0.1`. A box-window
    /// stand-in for Gaussian weighting, not a true Gaussian kernel.
    Gaussian,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdaptiveThresholdConfig {
    /// Side of the square window, expected odd
    #[schemars(range(min = 3))]
    pub window_size: u32,
    pub constant: f32,
    #[serde(default)]
    pub method: AdaptiveMethod,
}

impl Default for AdaptiveThresholdConfig {
    fn default() -> Self {
        Self {
            window_size: 11,
            constant: 2.0,
            method: AdaptiveMethod::Mean,
        }
    }
}

/// Summed-area table with a zero first row and column, so the sum over
/// `[x0, x1) x [y0, y1)` is four lookups.
pub struct IntegralImage {
    stride: usize,
    sums: Vec<f64>,
}

impl IntegralImage {
    pub fn build<F>(width: u32, height: u32, mut value: F) -> Self
    where
        F: FnMut(u32, u32) -> f64,
    {
        let stride = width as usize + 1;
        let mut sums = vec![0.0; stride * (height as usize + 1)];
        for y in 0..height as usize {
            let mut row_sum = 0.0;
            for x in 0..width as usize {
                row_sum += value(x as u32, y as u32);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    #[inline]
    pub fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        self.sums[y1 * self.stride + x1] - self.sums[y0 * self.stride + x1]
            - self.sums[y1 * self.stride + x0]
            + self.sums[y0 * self.stride + x0]
    }
}

/// Local-window threshold: a pixel is selected when it is brighter than its
/// window's threshold. Windows are clipped at the image edge.
pub fn adaptive_threshold<T: Intensity>(
    image: &IntensityImage<'_, T>,
    config: &AdaptiveThresholdConfig,
) -> MaskOperationResult {
    let (width, height) = image.dimensions();
    let half = (config.window_size / 2) as usize;
    let sums = IntegralImage::build(width, height, |x, y| image.value(x, y) as f64);
    let squares = match config.method {
        AdaptiveMethod::Gaussian => Some(IntegralImage::build(width, height, |x, y| {
            let v = image.value(x, y) as f64;
            v * v
        })),
        AdaptiveMethod::Mean => None,
    };

    let mut mask = Mask::new(width, height);
    for y in 0..height as usize {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(height as usize);
        for x in 0..width as usize {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(width as usize);
            let n = ((x1 - x0) * (y1 - y0)) as f64;
            let mean = sums.sum(x0, y0, x1, y1) / n;
            let threshold = match &squares {
                None => mean - config.constant as f64,
                Some(squares) => {
                    let variance = (squares.sum(x0, y0, x1, y1) / n - mean * mean).max(0.0);
                    mean - config.constant as f64 * variance.sqrt() * 0.1
                }
            };
            if image.value(x as u32, y as u32) as f64 > threshold {
                mask.set(x as u32, y as u32, true);
            }
        }
    }
    mask.into()
}
