use crate::{
    error::Result,
    types::{Mask, MaskOperationResult},
};

fn combine<F>(a: &Mask, b: &Mask, op: F) -> Result<MaskOperationResult>
where
    F: Fn(bool, bool) -> bool,
{
    a.ensure_same_size(b)?;
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&pa, &pb)| op(pa != 0, pb != 0) as u8)
        .collect();
    Ok(Mask {
        width: a.width,
        height: a.height,
        data,
    }
    .into())
}

/// `a ∨ b`
pub fn mask_union(a: &Mask, b: &Mask) -> Result<MaskOperationResult> {
    combine(a, b, |pa, pb| pa || pb)
}

/// `a ∧ b`
pub fn mask_intersect(a: &Mask, b: &Mask) -> Result<MaskOperationResult> {
    combine(a, b, |pa, pb| pa && pb)
}

/// `a ∧ ¬b`
pub fn mask_subtract(a: &Mask, b: &Mask) -> Result<MaskOperationResult> {
    combine(a, b, |pa, pb| pa && !pb)
}

/// `a ⊕ b`
pub fn mask_xor(a: &Mask, b: &Mask) -> Result<MaskOperationResult> {
    combine(a, b, |pa, pb| pa != pb)
}

/// Flip every pixel 0↔1
pub fn mask_invert(mask: &Mask) -> MaskOperationResult {
    let data = mask.data.iter().map(|&v| (v == 0) as u8).collect();
    Mask {
        width: mask.width,
        height: mask.height,
        data,
    }
    .into()
}

/// Union of any number of equally sized masks. `None` for an empty slice.
pub fn mask_union_all<'a, I>(masks: I) -> Result<Option<MaskOperationResult>>
where
    I: IntoIterator<Item = &'a Mask>,
{
    let mut iter = masks.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let mut acc = first.clone();
    for mask in iter {
        acc = mask_union(&acc, mask)?.mask;
    }
    Ok(Some(acc.into()))
}
