pub mod builder;

use tracing::debug;

use crate::{
    contour::{simplify_contour, ComputedOutline},
    error::Result,
    traits::{ContourExtractor, HoleDetector, MaskRefiner},
    types::{Mask, MaskOperationResult},
};

/// Ordered chain of mask refinements, optionally followed by outline
/// extraction.
pub struct RefinementPipeline {
    refiners: Vec<Box<dyn MaskRefiner>>,
    contour_extractor: Box<dyn ContourExtractor>,
    hole_detector: Box<dyn HoleDetector>,
    simplify_tolerance: Option<f32>,
}

impl RefinementPipeline {
    pub fn builder() -> builder::RefinementPipelineBuilder {
        builder::RefinementPipelineBuilder::new()
    }

    pub fn new(
        refiners: Vec<Box<dyn MaskRefiner>>,
        contour_extractor: Box<dyn ContourExtractor>,
        hole_detector: Box<dyn HoleDetector>,
        simplify_tolerance: Option<f32>,
    ) -> Self {
        Self {
            refiners,
            contour_extractor,
            hole_detector,
            simplify_tolerance,
        }
    }

    /// Run every refiner in order on a copy of `mask`
    pub fn process(&self, mask: &Mask) -> Result<MaskOperationResult> {
        let mut current = mask.clone();
        for refiner in &self.refiners {
            current = refiner.refine(&current)?;
        }
        let result = MaskOperationResult::from(current);
        debug!(
            steps = self.refiners.len(),
            before = mask.pixel_count(),
            after = result.pixel_count,
            "refinement pipeline"
        );
        Ok(result)
    }

    /// Refine, then extract and group outlines
    pub fn process_outline(&self, mask: &Mask) -> Result<ComputedOutline> {
        let refined = self.process(mask)?.mask;
        let contours = self.contour_extractor.extract_contours(&refined)?;
        let mut shapes = self.hole_detector.detect_holes(contours)?;

        if let Some(tolerance) = self.simplify_tolerance {
            for shape in shapes.iter_mut() {
                shape.exterior = simplify_contour(&shape.exterior, tolerance);
                for hole in shape.holes.iter_mut() {
                    *hole = simplify_contour(hole, tolerance);
                }
            }
        }
        shapes.retain(|shape| shape.exterior.len() >= 3);

        Ok(ComputedOutline {
            shapes,
            image_width: refined.width,
            image_height: refined.height,
        })
    }

    pub fn len(&self) -> usize {
        self.refiners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refiners.is_empty()
    }

    pub fn info(&self) -> String {
        format!(
            "RefinementPipeline: {} refiners, simplification {}",
            self.refiners.len(),
            match self.simplify_tolerance {
                Some(t) => format!("{t}"),
                None => "off".to_string(),
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::MaskCommand;

    fn blob_with_speck() -> Mask {
        Mask::from_fn(30, 30, |x, y| {
            ((8..20).contains(&x) && (8..20).contains(&y)) || (x == 3 && y == 3)
        })
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mask = blob_with_speck();
        let result = RefinementPipeline::builder()
            .build()
            .process(&mask)
            .expect("Should process");
        assert_eq!(result.mask, mask);
        assert_eq!(result.pixel_count, 145);
    }

    #[test]
    fn test_open_removes_speck() {
        let pipeline = RefinementPipeline::builder().open(1).build();
        let result = pipeline.process(&blob_with_speck()).expect("Should process");
        assert!(!result.mask.get(3, 3));
        assert!(result.mask.get(14, 14));
    }

    #[test]
    fn test_commands_run_in_order() {
        let mask = blob_with_speck();
        let pipeline = RefinementPipeline::builder()
            .with_commands(vec![
                MaskCommand::KeepLargestComponent {
                    connectivity: Default::default(),
                },
                MaskCommand::Invert,
            ])
            .build();
        assert_eq!(pipeline.len(), 2);
        let result = pipeline.process(&mask).expect("Should process");
        assert_eq!(result.pixel_count, 900 - 144);
    }

    #[test]
    fn test_outline_of_square_simplifies_to_corners() {
        let mask = Mask::from_fn(30, 30, |x, y| (8..20).contains(&x) && (8..20).contains(&y));
        let outline = RefinementPipeline::builder()
            .with_simplification(0.5)
            .build()
            .process_outline(&mask)
            .expect("Should outline");
        assert_eq!(outline.shapes.len(), 1);
        assert_eq!(outline.shapes[0].exterior.len(), 4);
        assert!(!outline.shapes[0].has_holes());
        assert_eq!((outline.image_width, outline.image_height), (30, 30));
    }

    #[test]
    fn test_default_outline_of_ring_has_one_hole() {
        let mask = Mask::from_fn(12, 12, |x, y| {
            let outer = (2..=9).contains(&x) && (2..=9).contains(&y);
            let hole = (5..=6).contains(&x) && (5..=6).contains(&y);
            outer && !hole
        });
        let outline = RefinementPipeline::builder()
            .build()
            .process_outline(&mask)
            .expect("Should outline");
        assert_eq!(outline.shapes.len(), 1);
        assert_eq!(outline.shapes[0].holes.len(), 1);
        assert_eq!(outline.shapes[0].holes[0].len(), 8);
    }
}
