use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::{
    error::Result,
    ops::{
        boolean::mask_invert,
        components::{keep_largest_component, remove_small_components, Connectivity},
        morphology::{boundary, close, dilate, erode, fill_holes, open, BoundaryKind},
    },
    traits::MaskRefiner,
    types::{Mask, MaskOperationResult},
};

/// A single-operand refinement step, serializable so refinement recipes can
/// be stored alongside tool presets.
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaskCommand {
    /// Grow the selection by a disk of the given radius
    Dilate {
        #[schemars(range(min = 1, max = 64))]
        radius: u32,
    },

    /// Shrink the selection by a disk of the given radius
    Erode {
        #[schemars(range(min = 1, max = 64))]
        radius: u32,
    },

    /// Erode then dilate (removes specks and thin spurs)
    Open {
        #[schemars(range(min = 1, max = 64))]
        radius: u32,
    },

    /// Dilate then erode (bridges small gaps)
    Close {
        #[schemars(range(min = 1, max = 64))]
        radius: u32,
    },

    FillHoles,

    Invert,

    Boundary { kind: BoundaryKind },

    KeepLargestComponent { connectivity: Connectivity },

    RemoveSmallComponents {
        min_size: usize,
        connectivity: Connectivity,
    },
}

impl MaskCommand {
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MaskCommand)
    }

    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dilate { .. } => "Grow the selection with a disk structuring element",
            Self::Erode { .. } => "Shrink the selection with a disk structuring element",
            Self::Open { .. } => "Remove specks and spurs narrower than the radius",
            Self::Close { .. } => "Bridge gaps narrower than the radius",
            Self::FillHoles => "Fill background regions not connected to the image border",
            Self::Invert => "Swap selected and unselected pixels",
            Self::Boundary { .. } => "Keep only the inner or outer boundary ring",
            Self::KeepLargestComponent { .. } => "Keep only the largest connected island",
            Self::RemoveSmallComponents { .. } => "Drop islands below a minimum pixel count",
        }
    }

    pub fn apply(&self, mask: &Mask) -> MaskOperationResult {
        match *self {
            Self::Dilate { radius } => dilate(mask, radius),
            Self::Erode { radius } => erode(mask, radius),
            Self::Open { radius } => open(mask, radius),
            Self::Close { radius } => close(mask, radius),
            Self::FillHoles => fill_holes(mask),
            Self::Invert => mask_invert(mask),
            Self::Boundary { kind } => boundary(mask, kind),
            Self::KeepLargestComponent { connectivity } => keep_largest_component(mask, connectivity),
            Self::RemoveSmallComponents {
                min_size,
                connectivity,
            } => remove_small_components(mask, min_size, connectivity),
        }
    }
}

impl MaskRefiner for MaskCommand {
    fn refine(&self, mask: &Mask) -> Result<Mask> {
        Ok(self.apply(mask).mask)
    }
}
