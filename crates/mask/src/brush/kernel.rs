use crate::brush::{BrushConfig, BrushShape};

/// Square `(2h+1)²` grid of opacities in `[0, 1]`, `h = ceil(radius)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushKernel {
    pub half: i64,
    pub radius: f32,
    pub shape: BrushShape,
    pub values: Vec<f32>,
}

impl BrushKernel {
    pub fn new(config: &BrushConfig) -> Self {
        let radius = config.radius.max(0.0);
        let half = radius.ceil() as i64;
        let size = (2 * half + 1) as usize;
        let mut values = vec![0.0; size * size];

        for dy in -half..=half {
            for dx in -half..=half {
                let distance = config.shape.distance(dx as f32, dy as f32);
                if distance > radius {
                    continue;
                }
                let value = if config.hardness >= 1.0 {
                    1.0
                } else {
                    let normalized = if radius > 0.0 { distance / radius } else { 0.0 };
                    (1.0 - normalized).powf((1.0 - config.hardness) * 3.0)
                };
                values[((dy + half) as usize) * size + (dx + half) as usize] = value;
            }
        }

        Self {
            half,
            radius,
            shape: config.shape,
            values,
        }
    }

    pub fn size(&self) -> usize {
        (2 * self.half + 1) as usize
    }

    #[inline]
    pub fn value(&self, dx: i64, dy: i64) -> f32 {
        let size = self.size();
        self.values[((dy + self.half) as usize) * size + (dx + self.half) as usize]
    }

    /// Non-zero cells as `(dx, dy, value)`
    pub fn cells(&self) -> impl Iterator<Item = (i64, i64, f32)> + '_ {
        let size = self.size() as i64;
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(move |(i, &v)| {
                let i = i as i64;
                (i % size - self.half, i / size - self.half, v)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(radius: f32, shape: BrushShape, hardness: f32) -> BrushConfig {
        BrushConfig {
            radius,
            shape,
            hardness,
            ..Default::default()
        }
    }

    #[test]
    fn test_hard_circle_coverage() {
        let kernel = BrushKernel::new(&config(5.0, BrushShape::Circle, 1.0));
        assert_eq!(kernel.size(), 11);
        assert_eq!(kernel.cells().count(), 81);
        assert!(kernel.cells().all(|(_, _, v)| v == 1.0));
    }

    #[test]
    fn test_square_and_diamond_coverage() {
        let square = BrushKernel::new(&config(2.0, BrushShape::Square, 1.0));
        assert_eq!(square.cells().count(), 25);
        let diamond = BrushKernel::new(&config(2.0, BrushShape::Diamond, 1.0));
        assert_eq!(diamond.cells().count(), 13);
    }

    #[test]
    fn test_soft_kernel_falls_off() {
        let kernel = BrushKernel::new(&config(4.0, BrushShape::Circle, 0.0));
        assert_eq!(kernel.value(0, 0), 1.0);
        // (1 - 0.5)^3
        assert!((kernel.value(2, 0) - 0.125).abs() < 1e-6);
        assert_eq!(kernel.value(4, 0), 0.0);
        assert!(kernel.value(1, 0) > kernel.value(2, 0));
    }

    #[test]
    fn test_zero_radius_is_single_cell() {
        let kernel = BrushKernel::new(&config(0.0, BrushShape::Circle, 0.3));
        assert_eq!(kernel.size(), 1);
        assert_eq!(kernel.value(0, 0), 1.0);
    }
}
