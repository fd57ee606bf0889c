//! # Mask
//!
//! Pixel-level core of the annotation tool: binary masks and their algebra,
//! intensity thresholding, brush rasterization, contour tracing and polygon
//! fill, and shape measurements.
//!
//! Every operation is a synchronous, pure transform over caller-supplied
//! buffers and returns a new mask; nothing here performs I/O.
//!
//! ## Quick Start
//!
//! ```rust
//! use mask::{brush::{apply_stroke, BrushConfig}, ops::fill_holes, Mask};
//!
//! let empty = Mask::new(64, 64);
//! let stroke = [[10.0, 10.0], [30.0, 12.0], [50.0, 40.0]];
//! let painted = apply_stroke(&empty, &stroke, &BrushConfig::default());
//! let filled = fill_holes(&painted.mask);
//! assert!(filled.pixel_count >= painted.pixel_count);
//! ```
//!
//! ## Refinement pipeline
//!
//! ```rust
//! use mask::{Mask, RefinementPipeline};
//!
//! let pipeline = RefinementPipeline::builder()
//!     .open(1)
//!     .fill_holes()
//!     .with_simplification(1.0)
//!     .build();
//! let outline = pipeline.process_outline(&Mask::filled(16, 16))?;
//! assert_eq!(outline.shapes.len(), 1);
//! # Ok::<(), mask::MaskError>(())
//! ```

pub mod annotation;
pub mod brush;
pub mod contour;
pub mod error;
pub mod measure;
pub mod ops;
pub mod pipeline;
pub mod rle;
pub mod threshold;
pub mod traits;
pub mod types;

pub use annotation::{rasterize_annotations, Annotation, FillMethod};
pub use contour::{ComplexShape, ComputedOutline};
pub use error::{MaskError, Result};
pub use pipeline::{builder::RefinementPipelineBuilder, RefinementPipeline};
pub use rle::Rle;
pub use traits::*;
pub use types::{Bounds, Intensity, IntensityImage, Mask, MaskOperationResult, Point};

use contour::{ContainmentHoleDetector, ImageprocContourExtractor, MooreContourExtractor, NoHoleDetector};

/// Moore tracing, every ring its own shape
pub type SimpleExtractor = StandardOutlineExtractor<MooreContourExtractor, NoHoleDetector>;

/// Border following with containment-based hole grouping
pub type HoleAwareExtractor = StandardOutlineExtractor<ImageprocContourExtractor, ContainmentHoleDetector>;

/// A contour extractor paired with a hole detector
#[derive(Debug, Clone, Default)]
pub struct StandardOutlineExtractor<C, H>
where
    C: ContourExtractor,
    H: HoleDetector,
{
    pub contour_extractor: C,
    pub hole_detector: H,
}

impl<C, H> StandardOutlineExtractor<C, H>
where
    C: ContourExtractor,
    H: HoleDetector,
{
    pub fn new(contour_extractor: C, hole_detector: H) -> Self {
        Self {
            contour_extractor,
            hole_detector,
        }
    }

    pub fn extract_outlines(&self, mask: &Mask) -> Result<Vec<ComplexShape>> {
        let contours = self.contour_extractor.extract_contours(mask)?;
        self.hole_detector.detect_holes(contours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed_square() -> Mask {
        Mask::from_fn(40, 40, |x, y| {
            let outer = (10..30).contains(&x) && (10..30).contains(&y);
            let inner = (16..24).contains(&x) && (16..24).contains(&y);
            outer && !inner
        })
    }

    #[test]
    fn test_hole_aware_extractor_finds_hole() {
        let shapes = HoleAwareExtractor::default()
            .extract_outlines(&framed_square())
            .expect("Should extract outlines");
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].holes.len(), 1);
    }

    #[test]
    fn test_simple_extractor_on_solid_square() {
        let mask = Mask::from_fn(20, 20, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
        let shapes = SimpleExtractor::default()
            .extract_outlines(&mask)
            .expect("Should extract outlines");
        assert_eq!(shapes.len(), 1);
        assert!(!shapes[0].has_holes());
    }

    #[test]
    fn test_threshold_then_refine_then_measure() {
        let data: Vec<u8> = (0..32 * 32)
            .map(|i| {
                let (x, y) = (i % 32, i / 32);
                if (8..24).contains(&x) && (8..24).contains(&y) && !(x == 15 && y == 15) {
                    200
                } else {
                    20
                }
            })
            .collect();
        let image = IntensityImage::new(&data, 32, 32).expect("Should wrap image");
        let config = threshold::ThresholdConfig {
            lower_threshold: 100.0,
            upper_threshold: 255.0,
            invert: false,
        };
        let segmented = threshold::threshold_segment(&image, &config);
        assert_eq!(segmented.segmentation.pixel_count, 255);

        let refined = RefinementPipeline::builder()
            .fill_holes()
            .build()
            .process(&segmented.segmentation.mask)
            .expect("Should refine");
        assert_eq!(refined.pixel_count, 256);

        let stats = measure::measure_mask(&refined.mask, &measure::PixelSpacing::default());
        assert_eq!(stats.perimeter, 64.0);
    }
}
