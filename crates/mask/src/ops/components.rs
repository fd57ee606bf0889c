use image::Luma;
use imageproc::region_labelling::connected_components;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::{Mask, MaskOperationResult};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    Four,
    #[default]
    Eight,
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => Self::Four,
            Connectivity::Eight => Self::Eight,
        }
    }
}

/// Per-pixel component ids (0 = background) and the size of each component,
/// indexed by id.
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    pub width: u32,
    pub height: u32,
    pub labels: Vec<u32>,
    pub sizes: Vec<usize>,
}

impl ComponentLabels {
    pub fn component_count(&self) -> usize {
        self.sizes.iter().skip(1).filter(|size| **size > 0).count()
    }

    /// Id of the component with the most pixels
    pub fn largest(&self) -> Option<u32> {
        self.sizes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, size)| **size > 0)
            .max_by_key(|(id, size)| (**size, std::cmp::Reverse(*id)))
            .map(|(id, _)| id as u32)
    }

    pub fn select<F>(&self, keep: F) -> Mask
    where
        F: Fn(u32, usize) -> bool,
    {
        let data = self
            .labels
            .iter()
            .map(|&id| (id != 0 && keep(id, self.sizes[id as usize])) as u8)
            .collect();
        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

pub fn label_components(mask: &Mask, connectivity: Connectivity) -> ComponentLabels {
    let labelled = connected_components(&mask.to_gray_image(), connectivity.into(), Luma([0u8]));
    let labels: Vec<u32> = labelled.into_raw();
    let max = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sizes = vec![0usize; max + 1];
    for &id in &labels {
        sizes[id as usize] += 1;
    }
    sizes[0] = 0;
    ComponentLabels {
        width: mask.width,
        height: mask.height,
        labels,
        sizes,
    }
}

/// Keep only the biggest connected island (ties go to the first found in raster order).
pub fn keep_largest_component(mask: &Mask, connectivity: Connectivity) -> MaskOperationResult {
    let components = label_components(mask, connectivity);
    match components.largest() {
        Some(largest) => components.select(|id, _| id == largest).into(),
        None => Mask::new(mask.width, mask.height).into(),
    }
}

/// Drop islands with fewer than `min_size` pixels.
pub fn remove_small_components(
    mask: &Mask,
    min_size: usize,
    connectivity: Connectivity,
) -> MaskOperationResult {
    label_components(mask, connectivity)
        .select(|_, size| size >= min_size)
        .into()
}
