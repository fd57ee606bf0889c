use std::collections::VecDeque;

use tracing::debug;

use crate::types::{Intensity, IntensityImage, Mask, MaskOperationResult};

const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Two-level threshold. Pixels `>= high` are strong; pixels in `[low, high)`
/// are kept only when 8-connected to a strong pixel through other kept pixels.
///
/// Promotion runs as a breadth-first worklist seeded with every strong
/// pixel, which reaches the same fixed point as repeated full-image passes.
pub fn hysteresis_threshold<T: Intensity>(
    image: &IntensityImage<'_, T>,
    low_threshold: f32,
    high_threshold: f32,
) -> MaskOperationResult {
    let (width, height) = image.dimensions();
    let mut mask = Mask::new(width, height);
    let mut queue = VecDeque::new();

    for (idx, v) in image.values().enumerate() {
        if v >= high_threshold {
            mask.data[idx] = 1;
            queue.push_back(idx);
        }
    }
    let strong = queue.len();

    while let Some(idx) = queue.pop_front() {
        let x = (idx % width as usize) as i64;
        let y = (idx / width as usize) as i64;
        for (dx, dy) in NEIGHBORS_8 {
            let (nx, ny) = (x + dx, y + dy);
            if !mask.contains_point(nx, ny) {
                continue;
            }
            let nidx = ny as usize * width as usize + nx as usize;
            if mask.data[nidx] != 0 {
                continue;
            }
            let v = image.data[nidx].to_f32();
            if v >= low_threshold && v < high_threshold {
                mask.data[nidx] = 1;
                queue.push_back(nidx);
            }
        }
    }

    let result = MaskOperationResult::from(mask);
    debug!(
        strong,
        promoted = result.pixel_count - strong,
        "hysteresis threshold"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weak_chain_attached_to_strong_is_kept() {
        #[rustfmt::skip]
        let data: [u8; 30] = [
            0,  0,  0,  0,  0,  0,
            0, 200, 80, 80,  0,  0,
            0,  0,  0,  0, 80,  0,
            0,  0,  0,  0,  0,  0,
            80, 80, 0,  0,  0,  0,
        ];
        let image = IntensityImage::new(&data, 6, 5).expect("Should wrap buffer");
        let result = hysteresis_threshold(&image, 50.0, 150.0);

        assert!(result.mask.get(1, 1));
        assert!(result.mask.get(3, 1));
        // Diagonal step counts as connected
        assert!(result.mask.get(4, 2));
        // Weak pair with no strong neighbour stays out
        assert!(!result.mask.get(0, 4));
        assert_eq!(result.pixel_count, 4);
    }

    #[test]
    fn test_no_strong_pixels_selects_nothing() {
        let data = vec![100.0f32; 25];
        let image = IntensityImage::new(&data, 5, 5).expect("Should wrap buffer");
        assert_eq!(hysteresis_threshold(&image, 50.0, 150.0).pixel_count, 0);
    }

    #[test]
    fn test_long_snake_is_fully_promoted() {
        // A weak serpentine path only seeded at one end
        let (w, h) = (30u32, 30u32);
        let data: Vec<f32> = (0..h)
            .flat_map(|y| {
                (0..w).map(move |x| {
                    let on_path = y % 2 == 0 || (y % 4 == 1 && x == w - 1) || (y % 4 == 3 && x == 0);
                    match (x, y) {
                        (0, 0) => 255.0,
                        _ if on_path => 100.0,
                        _ => 0.0,
                    }
                })
            })
            .collect();
        let image = IntensityImage::new(&data, w, h).expect("Should wrap buffer");
        let expected = data.iter().filter(|&&v| v > 0.0).count();
        assert_eq!(hysteresis_threshold(&image, 50.0, 200.0).pixel_count, expected);
    }
}
