use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use mask::{Mask, MaskError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LabelmapError, Result};

/// Row-major 3x3 identity orientation
pub const IDENTITY_DIRECTION: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Display metadata for one label id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelInfo {
    pub name: String,
    /// RGBA
    pub color: [u8; 4],
    pub visible: bool,
}

impl LabelInfo {
    pub fn new(name: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            color,
            visible: true,
        }
    }

    fn placeholder(label: u8) -> Self {
        Self::new(format!("Label {label}"), [128, 128, 128, 255])
    }
}

/// Inclusive voxel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeBounds {
    pub min: [u32; 3],
    pub max: [u32; 3],
}

/// A `w × h × d` label volume, one byte per voxel, 0 is background. Slices
/// are stored contiguously along z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labelmap3D {
    pub dimensions: [u32; 3],
    /// Voxel size in millimetres
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub direction: [f64; 9],
    pub data: Vec<u8>,
    pub labels: BTreeMap<u8, LabelInfo>,
    /// Slices that were rasterized from annotations rather than interpolated
    pub source_slices: BTreeSet<u32>,
    pub num_labels: usize,
    pub created_at: DateTime<Utc>,
}

impl Labelmap3D {
    /// All-background volume
    pub fn new(dimensions: [u32; 3], spacing: [f64; 3], origin: [f64; 3]) -> Self {
        let len = dimensions.iter().map(|&d| d as usize).product();
        Self {
            dimensions,
            spacing,
            origin,
            direction: IDENTITY_DIRECTION,
            data: vec![0; len],
            labels: BTreeMap::new(),
            source_slices: BTreeSet::new(),
            num_labels: 0,
            created_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions[0]
    }

    pub fn height(&self) -> u32 {
        self.dimensions[1]
    }

    pub fn depth(&self) -> u32 {
        self.dimensions[2]
    }

    pub fn slice_len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        z as usize * self.slice_len() + y as usize * self.width() as usize + x as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> u8 {
        self.data[self.index(x, y, z)]
    }

    fn check_slice(&self, z: u32) -> Result<()> {
        if z >= self.depth() {
            return Err(LabelmapError::SliceOutOfRange {
                slice: z,
                depth: self.depth(),
            });
        }
        Ok(())
    }

    pub(crate) fn slab(&self, z: u32) -> &[u8] {
        let start = z as usize * self.slice_len();
        &self.data[start..start + self.slice_len()]
    }

    pub(crate) fn slab_mut(&mut self, z: u32) -> &mut [u8] {
        let len = self.slice_len();
        let start = z as usize * len;
        &mut self.data[start..start + len]
    }

    /// Raw label values of slice `z`
    pub fn slice(&self, z: u32) -> Result<&[u8]> {
        self.check_slice(z)?;
        Ok(self.slab(z))
    }

    /// Binary mask of the voxels on slice `z` carrying `label`
    pub fn label_mask(&self, z: u32, label: u8) -> Result<Mask> {
        let slab = self.slice(z)?;
        Ok(Mask {
            width: self.width(),
            height: self.height(),
            data: slab.iter().map(|&v| (v == label) as u8).collect(),
        })
    }

    /// One mask per slice for `label`, ready for stack measurements
    pub fn label_masks(&self, label: u8) -> Vec<Mask> {
        (0..self.depth())
            .map(|z| Mask {
                width: self.width(),
                height: self.height(),
                data: self.slab(z).iter().map(|&v| (v == label) as u8).collect(),
            })
            .collect()
    }

    /// Replace slice `z` in place with raw label values. Unknown non-zero
    /// values get a placeholder label entry.
    pub fn set_slice(&mut self, z: u32, values: &[u8]) -> Result<()> {
        self.check_slice(z)?;
        if values.len() != self.slice_len() {
            return Err(MaskError::BufferLength {
                expected: self.slice_len(),
                actual: values.len(),
            }
            .into());
        }
        self.slab_mut(z).copy_from_slice(values);
        for &v in values {
            if v != 0 {
                self.labels.entry(v).or_insert_with(|| LabelInfo::placeholder(v));
            }
        }
        self.num_labels = self.labels.len();
        Ok(())
    }

    /// Replace slice `z` with `label` wherever `mask` is set, background elsewhere
    pub fn set_slice_mask(&mut self, z: u32, mask: &Mask, label: u8) -> Result<()> {
        if mask.dimensions() != (self.width(), self.height()) {
            return Err(LabelmapError::DimensionMismatch {
                expected: self.dimensions,
                actual: [mask.width, mask.height, self.depth()],
            });
        }
        let values: Vec<u8> = mask.data.iter().map(|&v| if v != 0 { label } else { 0 }).collect();
        self.set_slice(z, &values)
    }

    pub fn add_label(&mut self, label: u8, info: LabelInfo) {
        self.labels.insert(label, info);
        self.num_labels = self.labels.len();
    }

    pub fn voxel_count(&self, label: u8) -> u64 {
        self.data.iter().filter(|&&v| v == label).count() as u64
    }

    /// Tight bounds of `label`, `None` if no voxel carries it
    pub fn label_bounds(&self, label: u8) -> Option<VolumeBounds> {
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mut bounds: Option<VolumeBounds> = None;
        for (i, &v) in self.data.iter().enumerate() {
            if v != label {
                continue;
            }
            let p = [(i % w) as u32, ((i / w) % h) as u32, (i / (w * h)) as u32];
            match bounds.as_mut() {
                None => bounds = Some(VolumeBounds { min: p, max: p }),
                Some(b) => {
                    for axis in 0..3 {
                        b.min[axis] = b.min[axis].min(p[axis]);
                        b.max[axis] = b.max[axis].max(p[axis]);
                    }
                }
            }
        }
        bounds
    }
}

/// Overlay several volumes of identical shape. Later volumes overwrite
/// earlier ones wherever they are non-zero; label tables are merged the
/// same way. Geometry is taken from the first volume.
pub fn merge_labelmaps(maps: &[Labelmap3D]) -> Result<Labelmap3D> {
    let Some((first, rest)) = maps.split_first() else {
        return Err(LabelmapError::InvalidArgument(
            "cannot merge an empty list of labelmaps".to_string(),
        ));
    };

    let mut merged = first.clone();
    for map in rest {
        if map.dimensions != merged.dimensions {
            return Err(LabelmapError::DimensionMismatch {
                expected: merged.dimensions,
                actual: map.dimensions,
            });
        }
        for (dst, &src) in merged.data.iter_mut().zip(&map.data) {
            if src != 0 {
                *dst = src;
            }
        }
        merged
            .labels
            .extend(map.labels.iter().map(|(&id, info)| (id, info.clone())));
        merged.source_slices.extend(map.source_slices.iter().copied());
    }
    merged.num_labels = merged.labels.len();
    merged.created_at = Utc::now();
    Ok(merged)
}
