use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::volume::{Labelmap3D, VolumeBounds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelStatistics {
    pub label: u8,
    pub name: String,
    pub voxel_count: u64,
    /// mm³
    pub volume: f64,
    /// mm², exposed-voxel estimate
    pub surface_area: f64,
    pub bounds: Option<VolumeBounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelmapStatistics {
    pub labels: Vec<LabelStatistics>,
    pub total_voxels: u64,
    pub labeled_voxels: u64,
    pub labeled_volume: f64,
}

const FACE_NEIGHBOURS: [(i64, i64, i64); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Voxels of each label with at least one face neighbour carrying a
/// different value or lying outside the volume. Indexed by label value.
fn exposed_voxels(labelmap: &Labelmap3D) -> [u64; 256] {
    let [w, h, d] = labelmap.dimensions.map(|v| v as i64);
    let value_at = |x: i64, y: i64, z: i64| -> Option<u8> {
        if x < 0 || y < 0 || z < 0 || x >= w || y >= h || z >= d {
            return None;
        }
        Some(labelmap.get(x as u32, y as u32, z as u32))
    };

    let mut exposed = [0u64; 256];
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let Some(label) = value_at(x, y, z).filter(|&v| v != 0) else {
                    continue;
                };
                let on_surface = FACE_NEIGHBOURS
                    .iter()
                    .any(|&(dx, dy, dz)| value_at(x + dx, y + dy, z + dz) != Some(label));
                if on_surface {
                    exposed[label as usize] += 1;
                }
            }
        }
    }
    exposed
}

/// Per-label voxel counts, volumes and surface estimates. Every entry of
/// the label table is reported, including labels with no voxels.
///
/// Surface area is the number of exposed voxels times the square of the
/// mean spacing, a coarse estimate rather than a meshed surface.
pub fn compute_statistics(labelmap: &Labelmap3D) -> LabelmapStatistics {
    let mut counts = [0u64; 256];
    for &v in &labelmap.data {
        counts[v as usize] += 1;
    }
    let exposed = exposed_voxels(labelmap);
    let voxel_volume = labelmap.voxel_volume();
    let mean_spacing = labelmap.spacing.iter().sum::<f64>() / 3.0;
    let face_area = mean_spacing * mean_spacing;

    let labels: Vec<LabelStatistics> = labelmap
        .labels
        .iter()
        .map(|(&label, info)| {
            let voxel_count = counts[label as usize];
            LabelStatistics {
                label,
                name: info.name.clone(),
                voxel_count,
                volume: voxel_count as f64 * voxel_volume,
                surface_area: exposed[label as usize] as f64 * face_area,
                bounds: labelmap.label_bounds(label),
            }
        })
        .collect();

    let labeled_voxels = labelmap.data.len() as u64 - counts[0];
    LabelmapStatistics {
        labels,
        total_voxels: labelmap.data.len() as u64,
        labeled_voxels,
        labeled_volume: labeled_voxels as f64 * voxel_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::LabelInfo;

    fn cube(n: u32, spacing: [f64; 3]) -> Labelmap3D {
        let mut map = Labelmap3D::new([n + 2, n + 2, n + 2], spacing, [0.0; 3]);
        for z in 1..=n {
            let values: Vec<u8> = (0..(n + 2) * (n + 2))
                .map(|i| {
                    let (x, y) = (i % (n + 2), i / (n + 2));
                    (x >= 1 && x <= n && y >= 1 && y <= n) as u8
                })
                .collect();
            map.set_slice(z, &values).expect("Should set slice");
        }
        map
    }

    #[test]
    fn test_cube_statistics() {
        let map = cube(3, [1.0, 1.0, 2.0]);
        let stats = compute_statistics(&map);
        assert_eq!(stats.labels.len(), 1);
        let label = &stats.labels[0];
        assert_eq!(label.voxel_count, 27);
        assert_eq!(label.volume, 54.0);
        // all but the centre voxel are exposed; mean spacing is 4/3
        let face = (4.0f64 / 3.0).powi(2);
        assert!((label.surface_area - 26.0 * face).abs() < 1e-9);
        assert_eq!(label.bounds, Some(VolumeBounds { min: [1, 1, 1], max: [3, 3, 3] }));
        assert_eq!(stats.total_voxels, 125);
        assert_eq!(stats.labeled_voxels, 27);
    }

    #[test]
    fn test_border_voxels_count_as_exposed() {
        let mut map = Labelmap3D::new([3, 3, 3], [1.0; 3], [0.0; 3]);
        for z in 0..3 {
            map.set_slice(z, &[1; 9]).expect("Should set slice");
        }
        let stats = compute_statistics(&map);
        assert_eq!(stats.labels[0].surface_area, 26.0);
    }

    #[test]
    fn test_empty_label_is_reported() {
        let mut map = cube(2, [1.0; 3]);
        map.add_label(5, LabelInfo::new("Unused", [0, 0, 255, 255]));
        let stats = compute_statistics(&map);
        let unused = stats
            .labels
            .iter()
            .find(|l| l.label == 5)
            .expect("Should report empty label");
        assert_eq!(unused.voxel_count, 0);
        assert_eq!(unused.volume, 0.0);
        assert_eq!(unused.bounds, None);
    }
}
