//! # Labelmap
//!
//! Builds 3-D label volumes from sparse per-slice annotations, with optional
//! nearest-slice interpolation across unannotated gaps, and reports
//! per-label volumetric statistics.
//!
//! ## Example
//!
//! ```rust
//! use labelmap::{annotations_to_labelmap, compute_statistics, LabelmapOptions, SliceAnnotations};
//! use mask::Annotation;
//!
//! let square = Annotation::Polygon {
//!     points: vec![[4.0, 4.0], [12.0, 4.0], [12.0, 12.0], [4.0, 12.0]],
//! };
//! let mut annotations = SliceAnnotations::new();
//! annotations.insert(0, vec![square.clone()]);
//! annotations.insert(3, vec![square]);
//!
//! let options = LabelmapOptions {
//!     dimensions: [16, 16, 4],
//!     ..Default::default()
//! };
//! let labelmap = annotations_to_labelmap(&annotations, &options)?;
//! let stats = compute_statistics(&labelmap);
//! assert_eq!(stats.labels[0].voxel_count, 4 * labelmap.label_mask(0, 1)?.pixel_count() as u64);
//! # Ok::<(), labelmap::LabelmapError>(())
//! ```

pub mod builder;
pub mod error;
pub mod stats;
pub mod volume;

pub use builder::{annotations_to_labelmap, LabelmapOptions, SliceAnnotations};
pub use error::{LabelmapError, Result};
pub use stats::{compute_statistics, LabelStatistics, LabelmapStatistics};
pub use volume::{merge_labelmaps, LabelInfo, Labelmap3D, VolumeBounds, IDENTITY_DIRECTION};
