use std::fs;
use std::path::Path;

use image::GrayImage;
use labelmap::{LabelmapError, LabelmapOptions, SliceAnnotations};
use mask::{ops::MaskCommand, Annotation, IntensityImage, Mask, MaskError, RefinementPipeline};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    MaskError(#[from] MaskError),
    #[error(transparent)]
    LabelmapError(#[from] LabelmapError),
    #[error("Raster of {len} bytes does not fit {width}x{height}")]
    InvalidRaster { width: u32, height: u32, len: usize },
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// A job description stored as TOML or JSON, picked by file extension.
pub trait JobFile: Serialize + DeserializeOwned {
    fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path)?),
            Some("json") => Self::from_json(&fs::read_to_string(path)?),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(CliError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }
}

/// Refinement recipe applied to a mask image
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RefineJob {
    pub commands: Vec<MaskCommand>,
    /// Douglas-Peucker tolerance for exported outlines
    #[serde(default)]
    pub simplify_tolerance: Option<f32>,
}

impl JobFile for RefineJob {}

impl RefineJob {
    pub fn pipeline(&self) -> RefinementPipeline {
        let builder = RefinementPipeline::builder().with_commands(self.commands.iter().cloned());
        match self.simplify_tolerance {
            Some(tolerance) => builder.with_simplification(tolerance).build(),
            None => builder.build(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SliceEntry {
    pub slice: u32,
    pub annotations: Vec<Annotation>,
}

/// Volume options plus the annotations drawn on each slice
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LabelmapJob {
    #[serde(default)]
    pub options: LabelmapOptions,
    pub slices: Vec<SliceEntry>,
}

impl JobFile for LabelmapJob {}

impl LabelmapJob {
    /// Entries naming the same slice are concatenated
    pub fn slice_annotations(&self) -> SliceAnnotations {
        let mut map = SliceAnnotations::new();
        for entry in &self.slices {
            map.entry(entry.slice)
                .or_default()
                .extend(entry.annotations.iter().cloned());
        }
        map
    }
}

/// 8-bit intensity buffer read from an image file
#[derive(Debug, Clone)]
pub struct GrayInput {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GrayInput {
    pub fn view(&self) -> Result<IntensityImage<'_, u8>, CliError> {
        Ok(IntensityImage::new(&self.data, self.width, self.height)?)
    }
}

pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayInput, CliError> {
    let image = image::open(path)?.to_luma8();
    let (width, height) = image.dimensions();
    Ok(GrayInput {
        data: image.into_raw(),
        width,
        height,
    })
}

/// Any non-zero pixel counts as selected
pub fn load_mask<P: AsRef<Path>>(path: P) -> Result<Mask, CliError> {
    Ok(Mask::from_gray_image(&image::open(path)?.to_luma8()))
}

pub fn save_mask<P: AsRef<Path>>(mask: &Mask, path: P) -> Result<(), CliError> {
    mask.to_gray_image().save(path)?;
    Ok(())
}

/// Spread class indices `0..num_classes` over the 0-255 range
pub fn class_image(labels: &[u8], width: u32, height: u32, num_classes: usize) -> Result<GrayImage, CliError> {
    let step = 255 / num_classes.saturating_sub(1).max(1) as u32;
    let pixels = labels.iter().map(|&c| (c as u32 * step).min(255) as u8).collect();
    GrayImage::from_raw(width, height, pixels).ok_or(CliError::InvalidRaster {
        width,
        height,
        len: labels.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask::FillMethod;

    #[test]
    fn test_refine_job_from_toml() {
        let content = r#"
simplify_tolerance = 1.5

[[commands]]
type = "open"
params = { radius = 2 }

[[commands]]
type = "fill_holes"
"#;
        let job = RefineJob::from_toml(content).expect("Should parse refine job");
        assert_eq!(job.commands.len(), 2);
        assert_eq!(job.commands[0], MaskCommand::Open { radius: 2 });
        assert_eq!(job.simplify_tolerance, Some(1.5));
        assert_eq!(job.pipeline().len(), 2);
    }

    #[test]
    fn test_labelmap_job_from_json() {
        let content = r#"{
            "options": { "dimensions": [32, 32, 6], "fill_method": "boundary" },
            "slices": [
                { "slice": 0, "annotations": [ { "type": "polygon", "points": [[1,1],[9,1],[9,9]] } ] },
                { "slice": 0, "annotations": [ { "type": "brush", "points": [[20,20]], "radius": 2 } ] },
                { "slice": 5, "annotations": [] }
            ]
        }"#;
        let job = LabelmapJob::from_json(content).expect("Should parse labelmap job");
        assert_eq!(job.options.fill_method, FillMethod::Boundary);
        assert_eq!(job.options.label_id, 1);
        let slices = job.slice_annotations();
        assert_eq!(slices[&0].len(), 2);
        assert!(slices[&5].is_empty());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = RefineJob::from_file("job.yaml").expect_err("Should reject yaml");
        assert!(matches!(err, CliError::UnsupportedFileFormat));
    }

    #[test]
    fn test_class_image_spreads_levels() {
        let image = class_image(&[0, 1, 2, 1], 2, 2, 3).expect("Should build image");
        assert_eq!(image.as_raw(), &vec![0, 127, 254, 127]);

        let err = class_image(&[0, 1], 2, 2, 3).expect_err("Should reject short raster");
        assert!(matches!(err, CliError::InvalidRaster { .. }));
    }
}
