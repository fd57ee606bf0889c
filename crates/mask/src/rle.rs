use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{MaskError, Result},
    types::Mask,
};

/// Run-length encoded mask. Runs are taken in row-major order and alternate
/// starting with background, so `counts[0]` may be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rle {
    pub width: u32,
    pub height: u32,
    pub counts: Vec<u32>,
}

impl Rle {
    pub fn encode(mask: &Mask) -> Self {
        let mut counts = Vec::new();
        let mut current = 0u8;
        let mut run = 0u32;
        for &v in &mask.data {
            let v = (v != 0) as u8;
            if v != current {
                counts.push(run);
                run = 0;
                current = v;
            }
            run += 1;
        }
        counts.push(run);

        Self {
            width: mask.width,
            height: mask.height,
            counts,
        }
    }

    /// Expand back to a mask. Runs must cover exactly `width * height` pixels.
    pub fn decode(&self) -> Result<Mask> {
        let expected = self.width as usize * self.height as usize;
        let actual: usize = self.counts.iter().map(|&c| c as usize).sum();
        if actual != expected {
            return Err(MaskError::BufferLength { expected, actual });
        }

        let mut mask = Mask::new(self.width, self.height);
        let mut idx = 0usize;
        for (i, &count) in self.counts.iter().enumerate() {
            let end = idx + count as usize;
            if i % 2 == 1 {
                mask.data[idx..end].fill(1);
            }
            idx = end;
        }
        Ok(mask)
    }

    /// Number of set pixels (sum of the odd runs)
    pub fn area(&self) -> u64 {
        self.counts.iter().skip(1).step_by(2).map(|&c| c as u64).sum()
    }
}

impl From<&Mask> for Rle {
    fn from(mask: &Mask) -> Self {
        Self::encode(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_starts_with_background_run() {
        let mask = Mask::from_data(3, 2, vec![1, 1, 0, 0, 1, 1]).expect("Should build mask");
        let rle = Rle::encode(&mask);
        assert_eq!(rle.counts, vec![0, 2, 2, 2]);
        assert_eq!(rle.area(), 4);
        assert_eq!(rle.decode().expect("Should decode"), mask);
    }

    #[test]
    fn test_blank_mask_is_single_run() {
        let rle = Rle::encode(&Mask::new(4, 4));
        assert_eq!(rle.counts, vec![16]);
        assert_eq!(rle.area(), 0);
    }

    #[test]
    fn test_decode_rejects_short_runs() {
        let rle = Rle {
            width: 4,
            height: 4,
            counts: vec![3, 4],
        };
        let err = rle.decode().expect_err("Should reject");
        assert_eq!(err, MaskError::BufferLength { expected: 16, actual: 7 });
    }

    #[test]
    fn test_area_matches_pixel_count() {
        let mask = Mask::from_fn(20, 20, |x, y| (x * 7 + y * 3) % 5 == 0);
        assert_eq!(Rle::from(&mask).area(), mask.pixel_count() as u64);
    }
}
