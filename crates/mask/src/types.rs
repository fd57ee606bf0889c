use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, Result};

/// A 2-D point in image-pixel coordinates.
pub type Point = [f32; 2];

/// Binary selection raster. `data` holds `width * height` bytes in row-major
/// order, each either 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Mask {
    /// Create an empty (all zero) mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Create a mask with every pixel set
    pub fn filled(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![1; width as usize * height as usize],
        }
    }

    /// Wrap a caller buffer. Any non-zero byte is stored as 1.
    pub fn from_data(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(MaskError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        for v in data.iter_mut() {
            *v = (*v != 0) as u8;
        }
        Ok(Self { width, height, data })
    }

    /// Build a mask from a predicate over pixel coordinates
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    let idx = mask.index(x, y);
                    mask.data[idx] = 1;
                }
            }
        }
        mask
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)] != 0
    }

    /// Like [`Mask::get`] but treats anything outside the raster as unset.
    #[inline]
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = value as u8;
    }

    #[inline]
    pub fn contains_point(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    pub fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Tight bounding box of the set pixels, `{0,0,0,0}` when nothing is set.
    pub fn bounds(&self) -> Bounds {
        let mut bounds: Option<Bounds> = None;
        for y in 0..self.height {
            let row = &self.data[y as usize * self.width as usize..(y as usize + 1) * self.width as usize];
            for (x, &v) in row.iter().enumerate() {
                if v == 0 {
                    continue;
                }
                let x = x as u32;
                match bounds.as_mut() {
                    Some(b) => b.expand_to_contain(x, y),
                    None => {
                        bounds = Some(Bounds {
                            min_x: x,
                            min_y: y,
                            max_x: x,
                            max_y: y,
                        })
                    }
                }
            }
        }
        bounds.unwrap_or_default()
    }

    /// Every set pixel of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Mask) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(&a, &b)| a == 0 || b != 0)
    }

    pub fn ensure_same_size(&self, other: &Mask) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(MaskError::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }

    /// Iterate over the coordinates of set pixels in raster order
    pub fn set_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    /// Any non-zero luma counts as selected
    pub fn from_gray_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image.as_raw().iter().map(|&v| (v != 0) as u8).collect();
        Self { width, height, data }
    }

    /// Render as a 0/255 grayscale image
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}

/// Inclusive pixel bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Bounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Bounds {
    pub fn expand_to_contain(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// A mask together with its set-pixel count and tight bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskOperationResult {
    pub mask: Mask,
    pub pixel_count: usize,
    pub bounds: Bounds,
}

impl From<Mask> for MaskOperationResult {
    fn from(mask: Mask) -> Self {
        let pixel_count = mask.pixel_count();
        let bounds = if pixel_count == 0 {
            Bounds::default()
        } else {
            mask.bounds()
        };
        Self {
            mask,
            pixel_count,
            bounds,
        }
    }
}

impl MaskOperationResult {
    pub fn into_mask(self) -> Mask {
        self.mask
    }
}

/// Scalar sample types accepted as raw intensity input.
pub trait Intensity: Copy + Send + Sync {
    fn to_f32(self) -> f32;
}

macro_rules! impl_intensity {
    ($($t:ty),*) => {
        $(
            impl Intensity for $t {
                #[inline]
                fn to_f32(self) -> f32 {
                    self as f32
                }
            }
        )*
    };
}

impl_intensity!(u8, u16, i16, u32, i32, f32, f64);

/// Borrowed row-major intensity buffer matching an image's pixel grid.
#[derive(Clone, Copy)]
pub struct IntensityImage<'a, T> {
    pub data: &'a [T],
    pub width: u32,
    pub height: u32,
}

impl<'a, T: Intensity> IntensityImage<'a, T> {
    pub fn new(data: &'a [T], width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(MaskError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize].to_f32()
    }

    /// Sample with coordinates clamped to the image edge
    #[inline]
    pub fn value_clamped(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.value(x, y)
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().map(|v| v.to_f32())
    }

    /// `None` for an empty buffer
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Sobel gradient magnitude at a pixel, edges replicated
    pub fn sobel_magnitude(&self, x: i64, y: i64) -> f32 {
        let p = |dx: i64, dy: i64| self.value_clamped(x + dx, y + dy);
        let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
        let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
        (gx * gx + gy * gy).sqrt()
    }
}
