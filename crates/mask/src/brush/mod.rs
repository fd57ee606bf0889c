//! Brush rasterization: kernel generation, plain strokes, multi-slice strokes
//! with depth falloff, and the edge-aware adaptive brush.

pub mod adaptive;
pub mod kernel;
pub mod stroke;

pub use adaptive::*;
pub use kernel::*;
pub use stroke::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{MaskError, Result};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BrushShape {
    /// Euclidean distance
    #[default]
    Circle,
    /// Chebyshev distance
    Square,
    /// Manhattan distance
    Diamond,
}

impl BrushShape {
    /// Distance from the kernel centre under this shape's metric
    #[inline]
    pub fn distance(self, dx: f32, dy: f32) -> f32 {
        match self {
            Self::Circle => (dx * dx + dy * dy).sqrt(),
            Self::Square => dx.abs().max(dy.abs()),
            Self::Diamond => dx.abs() + dy.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BrushConfig {
    #[schemars(range(min = 0.0))]
    pub radius: f32,
    pub shape: BrushShape,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub hardness: f32,
    #[schemars(range(min = 0.0, max = 1.0))]
    pub opacity: f32,
    pub is_eraser: bool,
    /// Minimum gap between stamps as a fraction of the brush diameter
    pub spacing: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            shape: BrushShape::Circle,
            hardness: 1.0,
            opacity: 1.0,
            is_eraser: false,
            spacing: 0.25,
        }
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MaskError::InvalidArgument(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl BrushConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.radius >= 0.0) {
            return Err(MaskError::InvalidArgument(format!(
                "brush radius must be non-negative, got {}",
                self.radius
            )));
        }
        if !(self.spacing > 0.0) {
            return Err(MaskError::InvalidArgument(format!(
                "brush spacing must be positive, got {}",
                self.spacing
            )));
        }
        check_unit("hardness", self.hardness)?;
        check_unit("opacity", self.opacity)
    }

    /// Distance below which a stroke point does not get its own stamp
    pub fn min_stamp_distance(&self) -> f32 {
        self.radius * self.spacing * 2.0
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DepthFalloff {
    #[default]
    None,
    Linear,
    Gaussian,
}

impl DepthFalloff {
    /// Opacity multiplier for a slice `dz` away from the current one.
    pub fn factor(self, dz: i64, half_depth: u32) -> f32 {
        let dz = dz.unsigned_abs() as f32;
        match self {
            Self::None => 1.0,
            Self::Linear => 1.0 - dz / (half_depth as f32 + 1.0),
            Self::Gaussian => {
                let sigma = half_depth as f32 / 2.0;
                if sigma <= 0.0 {
                    return if dz == 0.0 { 1.0 } else { 0.0 };
                }
                (-(dz * dz) / (2.0 * sigma * sigma)).exp()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Brush3DConfig {
    #[serde(flatten)]
    pub brush: BrushConfig,
    /// Number of slices touched, centred on the current one; expected odd
    #[schemars(range(min = 1))]
    pub depth: u32,
    #[serde(default)]
    pub depth_falloff: DepthFalloff,
}

impl Default for Brush3DConfig {
    fn default() -> Self {
        Self {
            brush: BrushConfig::default(),
            depth: 3,
            depth_falloff: DepthFalloff::None,
        }
    }
}

impl Brush3DConfig {
    pub fn half_depth(&self) -> u32 {
        self.depth.max(1).saturating_sub(1) / 2
    }

    pub fn validate(&self) -> Result<()> {
        self.brush.validate()?;
        if self.depth == 0 || self.depth % 2 == 0 {
            return Err(MaskError::InvalidArgument(format!(
                "brush depth must be an odd number of slices, got {}",
                self.depth
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdaptiveBrushConfig {
    #[serde(flatten)]
    pub brush: BrushConfig,
    /// Intensity difference from the stamp centre accepted at full strength
    #[schemars(range(min = 0.0))]
    pub intensity_tolerance: f32,
    /// Sobel magnitude below which a pixel is not considered an edge
    #[schemars(range(min = 0.0))]
    pub gradient_threshold: f32,
    pub edge_snapping: bool,
    /// Weight of the edge factor against the intensity factor
    #[schemars(range(min = 0.0, max = 1.0))]
    pub edge_strength: f32,
}

impl Default for AdaptiveBrushConfig {
    fn default() -> Self {
        Self {
            brush: BrushConfig::default(),
            intensity_tolerance: 20.0,
            gradient_threshold: 50.0,
            edge_snapping: true,
            edge_strength: 0.5,
        }
    }
}

impl AdaptiveBrushConfig {
    pub fn validate(&self) -> Result<()> {
        self.brush.validate()?;
        if !(self.intensity_tolerance >= 0.0) || !(self.gradient_threshold >= 0.0) {
            return Err(MaskError::InvalidArgument(
                "intensity tolerance and gradient threshold must be non-negative".to_string(),
            ));
        }
        check_unit("edge strength", self.edge_strength)
    }
}
