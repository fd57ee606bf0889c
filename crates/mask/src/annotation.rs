//! Per-slice vector annotations and their rasterization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    brush::stroke::paint_disks,
    contour::{draw_outline_into, fill_polygon_into},
    types::{Mask, Point},
};

/// How closed annotations are rasterized
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FillMethod {
    /// Scanline fill of the polygon interior
    #[default]
    Filled,
    /// One-pixel closed outline only
    Boundary,
}

/// A user-drawn annotation on one slice, in image-pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Open brush path painted with its own radius
    Brush { points: Vec<Point>, radius: f32 },

    /// Free-hand path; once `completed` it is treated as a closed polygon
    Freehand {
        points: Vec<Point>,
        radius: f32,
        #[serde(default)]
        completed: bool,
    },

    Polygon { points: Vec<Point> },
}

impl Annotation {
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Brush { points, .. }
            | Self::Freehand { points, .. }
            | Self::Polygon { points } => points,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Self::Brush { .. } => false,
            Self::Freehand { completed, .. } => *completed,
            Self::Polygon { .. } => true,
        }
    }

    /// Draw into an existing mask, only ever setting pixels
    pub fn rasterize_into(&self, mask: &mut Mask, fill: FillMethod) {
        match self {
            Self::Brush { points, radius }
            | Self::Freehand {
                points,
                radius,
                completed: false,
            } => paint_disks(mask, points, *radius),
            Self::Freehand { points, .. } | Self::Polygon { points } => match fill {
                FillMethod::Filled => fill_polygon_into(mask, points),
                FillMethod::Boundary => draw_outline_into(mask, points),
            },
        }
    }

    pub fn rasterize(&self, width: u32, height: u32, fill: FillMethod) -> Mask {
        let mut mask = Mask::new(width, height);
        self.rasterize_into(&mut mask, fill);
        mask
    }
}

/// Union of every annotation drawn on one `width × height` slice
pub fn rasterize_annotations(
    annotations: &[Annotation],
    width: u32,
    height: u32,
    fill: FillMethod,
) -> Mask {
    let mut mask = Mask::new(width, height);
    for annotation in annotations {
        annotation.rasterize_into(&mut mask, fill);
    }
    mask
}
