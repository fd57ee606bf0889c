use crate::{
    contour::{ContainmentHoleDetector, MooreContourExtractor},
    ops::{components::Connectivity, MaskCommand},
    pipeline::RefinementPipeline,
    traits::{ContourExtractor, HoleDetector, MaskRefiner},
};

/// Fluent builder for [`RefinementPipeline`]
pub struct RefinementPipelineBuilder {
    refiners: Vec<Box<dyn MaskRefiner>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    hole_detector: Option<Box<dyn HoleDetector>>,
    simplify_tolerance: Option<f32>,
}

impl RefinementPipelineBuilder {
    pub fn new() -> Self {
        Self {
            refiners: Vec::new(),
            contour_extractor: None,
            hole_detector: None,
            simplify_tolerance: None,
        }
    }

    pub fn add_refiner<R>(mut self, refiner: R) -> Self
    where
        R: MaskRefiner + 'static,
    {
        self.refiners.push(Box::new(refiner));
        self
    }

    pub fn add_command(self, command: MaskCommand) -> Self {
        self.add_refiner(command)
    }

    /// Append a stored refinement recipe
    pub fn with_commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = MaskCommand>,
    {
        for command in commands {
            self = self.add_command(command);
        }
        self
    }

    pub fn dilate(self, radius: u32) -> Self {
        self.add_command(MaskCommand::Dilate { radius })
    }

    pub fn erode(self, radius: u32) -> Self {
        self.add_command(MaskCommand::Erode { radius })
    }

    pub fn open(self, radius: u32) -> Self {
        self.add_command(MaskCommand::Open { radius })
    }

    pub fn close(self, radius: u32) -> Self {
        self.add_command(MaskCommand::Close { radius })
    }

    pub fn fill_holes(self) -> Self {
        self.add_command(MaskCommand::FillHoles)
    }

    pub fn keep_largest_component(self, connectivity: Connectivity) -> Self {
        self.add_command(MaskCommand::KeepLargestComponent { connectivity })
    }

    pub fn remove_small_components(self, min_size: usize, connectivity: Connectivity) -> Self {
        self.add_command(MaskCommand::RemoveSmallComponents {
            min_size,
            connectivity,
        })
    }

    /// Replace the contour extractor used by `process_outline`
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    pub fn set_hole_detector<H>(mut self, detector: H) -> Self
    where
        H: HoleDetector + 'static,
    {
        self.hole_detector = Some(Box::new(detector));
        self
    }

    /// Douglas-Peucker simplify extracted outlines
    pub fn with_simplification(mut self, tolerance: f32) -> Self {
        self.simplify_tolerance = Some(tolerance);
        self
    }

    /// Defaults: Moore tracing and containment-based hole grouping
    pub fn build(self) -> RefinementPipeline {
        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(MooreContourExtractor));
        let hole_detector = self
            .hole_detector
            .unwrap_or_else(|| Box::new(ContainmentHoleDetector));

        RefinementPipeline::new(
            self.refiners,
            contour_extractor,
            hole_detector,
            self.simplify_tolerance,
        )
    }
}

impl Default for RefinementPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
