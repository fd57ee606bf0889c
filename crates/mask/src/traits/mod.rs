use crate::{contour::outline::ComplexShape, error::Result, types::Mask};

/// A mask-to-mask refinement step (morphology, component filtering, ...)
pub trait MaskRefiner: Send + Sync {
    fn refine(&self, mask: &Mask) -> Result<Mask>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract ordered boundary polygons from a mask
    fn extract_contours(&self, mask: &Mask) -> Result<Vec<Vec<[f32; 2]>>>;
}

/// Trait for grouping contours into shapes with holes
pub trait HoleDetector: Send + Sync {
    fn detect_holes(&self, contours: Vec<Vec<[f32; 2]>>) -> Result<Vec<ComplexShape>>;
}
