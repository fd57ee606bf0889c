use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::{Mask, MaskOperationResult};

const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Offsets `(dx, dy)` of a disk structuring element: `dx² + dy² ≤ r²`.
pub fn disk_offsets(radius: u32) -> Vec<(i64, i64)> {
    let r = radius as i64;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// A pixel is set if any pixel under the disk is set.
pub fn dilate(mask: &Mask, radius: u32) -> MaskOperationResult {
    if radius == 0 {
        return mask.clone().into();
    }
    let offsets = disk_offsets(radius);
    let mut out = Mask::new(mask.width, mask.height);
    for y in 0..mask.height {
        for x in 0..mask.width {
            let hit = offsets
                .iter()
                .any(|&(dx, dy)| mask.get_signed(x as i64 + dx, y as i64 + dy));
            if hit {
                out.set(x, y, true);
            }
        }
    }
    out.into()
}

/// A pixel stays set only if every pixel under the disk is set. Pixels
/// outside the raster count as unset, so selections shrink at the border.
pub fn erode(mask: &Mask, radius: u32) -> MaskOperationResult {
    if radius == 0 {
        return mask.clone().into();
    }
    let offsets = disk_offsets(radius);
    let mut out = Mask::new(mask.width, mask.height);
    for y in 0..mask.height {
        for x in 0..mask.width {
            if !mask.get(x, y) {
                continue;
            }
            let all = offsets
                .iter()
                .all(|&(dx, dy)| mask.get_signed(x as i64 + dx, y as i64 + dy));
            if all {
                out.set(x, y, true);
            }
        }
    }
    out.into()
}

/// Erode then dilate
pub fn open(mask: &Mask, radius: u32) -> MaskOperationResult {
    dilate(&erode(mask, radius).mask, radius)
}

/// Dilate then erode
pub fn close(mask: &Mask, radius: u32) -> MaskOperationResult {
    erode(&dilate(mask, radius).mask, radius)
}

/// Set every background pixel that is not 4-connected to the image border.
pub fn fill_holes(mask: &Mask) -> MaskOperationResult {
    if mask.data.is_empty() {
        return mask.clone().into();
    }
    let (w, h) = (mask.width as i64, mask.height as i64);
    let mut reached = vec![false; mask.data.len()];
    let mut stack: Vec<(i64, i64)> = Vec::new();

    let seed = |x: i64, y: i64, reached: &mut [bool], stack: &mut Vec<(i64, i64)>| {
        let idx = (y * w + x) as usize;
        if mask.data[idx] == 0 && !reached[idx] {
            reached[idx] = true;
            stack.push((x, y));
        }
    };

    for x in 0..w {
        seed(x, 0, &mut reached, &mut stack);
        seed(x, h - 1, &mut reached, &mut stack);
    }
    for y in 0..h {
        seed(0, y, &mut reached, &mut stack);
        seed(w - 1, y, &mut reached, &mut stack);
    }

    while let Some((x, y)) = stack.pop() {
        for (dx, dy) in NEIGHBORS_4 {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            seed(nx, ny, &mut reached, &mut stack);
        }
    }

    let data = mask
        .data
        .iter()
        .zip(&reached)
        .map(|(&v, &bg)| (v != 0 || !bg) as u8)
        .collect();
    Mask {
        width: mask.width,
        height: mask.height,
        data,
    }
    .into()
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryKind {
    /// Set pixels touching background or the image edge
    #[default]
    Inner,
    /// Background pixels touching the selection
    Outer,
}

pub fn boundary(mask: &Mask, kind: BoundaryKind) -> MaskOperationResult {
    match kind {
        BoundaryKind::Inner => inner_boundary(mask),
        BoundaryKind::Outer => outer_boundary(mask),
    }
}

/// Set pixels with at least one unset 4-neighbour, or on the image edge.
pub fn inner_boundary(mask: &Mask) -> MaskOperationResult {
    let mut out = Mask::new(mask.width, mask.height);
    for (x, y) in mask.set_pixels() {
        let exposed = NEIGHBORS_4
            .iter()
            .any(|&(dx, dy)| !mask.get_signed(x as i64 + dx, y as i64 + dy));
        if exposed {
            out.set(x, y, true);
        }
    }
    out.into()
}

/// Unset pixels with at least one set 4-neighbour.
pub fn outer_boundary(mask: &Mask) -> MaskOperationResult {
    let mut out = Mask::new(mask.width, mask.height);
    for y in 0..mask.height {
        for x in 0..mask.width {
            if mask.get(x, y) {
                continue;
            }
            let touching = NEIGHBORS_4
                .iter()
                .any(|&(dx, dy)| mask.get_signed(x as i64 + dx, y as i64 + dy));
            if touching {
                out.set(x, y, true);
            }
        }
    }
    out.into()
}
