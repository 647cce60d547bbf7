//! NumPy broadcasting rules.
//!
//! Shapes are right-aligned; missing leading axes count as size 1. On each
//! axis the result extent is the common non-1 extent of the operands, and
//! two different non-1 extents are an error.
//!
//! The expression engine accumulates a result shape operand by operand with
//! [`broadcast_shape`]: the output starts filled with `usize::MAX`
//! ("unset") and every operand merges its own shape into it. The returned
//! flag says whether the operand matched the output exactly, which is the
//! first half of the trivial-broadcast test; the second half compares
//! strides with [`is_trivial_broadcast`].

use crate::shape::Shape;
use crate::{Result, XtensorError};

/// Marker for an output extent no operand has set yet.
pub const UNSET: usize = usize::MAX;

/// Merge `input` into the right-aligned `output` shape.
///
/// Returns `true` when `input` has the same rank as `output` and no axis
/// needed stretching. Fails when `output` has a lower rank than `input` or
/// when two non-1 extents disagree; `output` may be partially updated in
/// that case, so callers merge into a scratch shape.
pub fn broadcast_shape(input: &[usize], output: &mut [usize]) -> Result<bool> {
    if output.len() < input.len() {
        return Err(XtensorError::BroadcastMismatch {
            lhs: input.to_vec(),
            rhs: output.to_vec(),
        });
    }
    let offset = output.len() - input.len();
    let mut trivial = input.len() == output.len();
    for (i, &n) in input.iter().enumerate() {
        let out = &mut output[offset + i];
        if *out == UNSET {
            *out = n;
        } else if *out == 1 {
            trivial = trivial && n == 1;
            *out = n;
        } else if n == 1 {
            trivial = false;
        } else if *out != n {
            return Err(XtensorError::BroadcastMismatch {
                lhs: input.to_vec(),
                rhs: output.to_vec(),
            });
        }
    }
    Ok(trivial)
}

/// Broadcast shape of several operands.
pub fn broadcast_shapes(shapes: &[&[usize]]) -> Result<Shape> {
    let rank = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = Shape::from_elem(UNSET, rank);
    for shape in shapes {
        broadcast_shape(shape, &mut out)?;
    }
    // Axes no operand reached cannot exist: the highest-rank operand covers all.
    Ok(out)
}

/// Whether `strides` equal `reference` in count and value.
///
/// Operands passing this test can be read with the destination's flat
/// index, which lets assignment run a linear loop.
#[inline]
pub fn is_trivial_broadcast(strides: &[isize], reference: &[isize]) -> bool {
    strides == reference
}

/// Promote strides to a broadcast target shape by setting stride 0 for
/// stretched axes.
///
/// `src_dims` is right-aligned against `target_dims`; leading axes missing
/// from the source get stride 0 as well.
pub(crate) fn promote_strides_to_shape(
    target_dims: &[usize],
    src_dims: &[usize],
    src_strides: &[isize],
) -> Result<Vec<isize>> {
    if src_dims.len() > target_dims.len() {
        return Err(XtensorError::RankMismatch(target_dims.len(), src_dims.len()));
    }
    if src_strides.len() != src_dims.len() {
        return Err(XtensorError::StrideLengthMismatch);
    }

    let offset = target_dims.len() - src_dims.len();
    let mut out = vec![0isize; target_dims.len()];
    for i in 0..src_dims.len() {
        let sdim = src_dims[i];
        let tdim = target_dims[offset + i];
        if sdim == tdim {
            out[offset + i] = if sdim == 1 { 0 } else { src_strides[i] };
        } else if sdim == 1 {
            out[offset + i] = 0;
        } else {
            return Err(XtensorError::BroadcastMismatch {
                lhs: src_dims.to_vec(),
                rhs: target_dims.to_vec(),
            });
        }
    }

    Ok(out)
}
