use std::collections::BTreeMap;

use mask::{rasterize_annotations, Annotation, FillMethod};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::{LabelmapError, Result},
    volume::{LabelInfo, Labelmap3D},
};

/// Annotations keyed by slice index
pub type SliceAnnotations = BTreeMap<u32, Vec<Annotation>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LabelmapOptions {
    /// `[width, height, depth]` in voxels
    pub dimensions: [u32; 3],
    /// Voxel size in millimetres
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    #[schemars(range(min = 1, max = 255))]
    pub label_id: u8,
    pub label_name: String,
    /// RGBA
    pub color: [u8; 4],
    pub fill_method: FillMethod,
    /// Fill unannotated slices between annotated ones
    pub interpolate: bool,
    /// Largest slice distance that is still interpolated across
    pub max_interpolation_gap: u32,
}

impl Default for LabelmapOptions {
    fn default() -> Self {
        Self {
            dimensions: [512, 512, 1],
            spacing: [1.0, 1.0, 1.0],
            origin: [0.0, 0.0, 0.0],
            label_id: 1,
            label_name: "Segmentation".to_string(),
            color: [255, 0, 0, 255],
            fill_method: FillMethod::Filled,
            interpolate: true,
            max_interpolation_gap: 5,
        }
    }
}

impl LabelmapOptions {
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.contains(&0) {
            return Err(LabelmapError::InvalidArgument(format!(
                "dimensions must be non-zero, got {:?}",
                self.dimensions
            )));
        }
        if self.spacing.iter().any(|&s| !(s > 0.0)) {
            return Err(LabelmapError::InvalidArgument(format!(
                "spacing must be positive, got {:?}",
                self.spacing
            )));
        }
        if self.label_id == 0 {
            return Err(LabelmapError::InvalidArgument(
                "label id 0 is reserved for background".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rasterize per-slice annotations into a new single-label volume.
///
/// Brush and open free-hand paths are painted with their own radius; closed
/// annotations are filled (or outlined for [`FillMethod::Boundary`]). With
/// interpolation on, every gap between consecutive annotated slices that is
/// wider than one slice and no wider than `max_interpolation_gap` is filled
/// from the nearer bounding slice, over the union of both footprints.
#[instrument(skip_all, fields(slices = annotations.len(), label = options.label_id))]
pub fn annotations_to_labelmap(
    annotations: &SliceAnnotations,
    options: &LabelmapOptions,
) -> Result<Labelmap3D> {
    options.validate()?;
    let [width, height, depth] = options.dimensions;
    let mut labelmap = Labelmap3D::new(options.dimensions, options.spacing, options.origin);
    labelmap.add_label(
        options.label_id,
        LabelInfo::new(options.label_name.clone(), options.color),
    );

    for (&z, slice_annotations) in annotations {
        if z >= depth {
            warn!(slice = z, depth, "annotation slice outside volume, skipped");
            continue;
        }
        if slice_annotations.is_empty() {
            continue;
        }
        let mask = rasterize_annotations(slice_annotations, width, height, options.fill_method);
        let label = options.label_id;
        for (dst, &src) in labelmap.slab_mut(z).iter_mut().zip(&mask.data) {
            if src != 0 {
                *dst = label;
            }
        }
        labelmap.source_slices.insert(z);
        debug!(
            slice = z,
            annotations = slice_annotations.len(),
            pixels = mask.pixel_count(),
            "rasterized slice"
        );
    }

    if options.interpolate {
        interpolate_gaps(&mut labelmap, options.max_interpolation_gap);
    }
    Ok(labelmap)
}

/// Nearest-slice carry across gaps between source slices
fn interpolate_gaps(labelmap: &mut Labelmap3D, max_gap: u32) {
    let sources: Vec<u32> = labelmap.source_slices.iter().copied().collect();
    for pair in sources.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let gap = upper - lower;
        if gap <= 1 || gap > max_gap {
            continue;
        }

        let below = labelmap.slab(lower).to_vec();
        let above = labelmap.slab(upper).to_vec();
        for z in lower + 1..upper {
            let t = (z - lower) as f32 / gap as f32;
            let slab = labelmap.slab_mut(z);
            for ((dst, &a), &b) in slab.iter_mut().zip(&below).zip(&above) {
                *dst = match (a, b, t < 0.5) {
                    (0, 0, _) => 0,
                    (a, 0, _) | (0, a, _) => a,
                    (a, _, true) => a,
                    (_, b, false) => b,
                };
            }
        }
        debug!(lower, upper, "interpolated gap");
    }
}
