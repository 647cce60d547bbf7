//! Stride arithmetic shared by containers, views and steppers.
//!
//! Conventions:
//! - `strides[i]` is the number of elements between consecutive indices on
//!   axis `i`; a size-1 axis gets stride 0 so that broadcasting over it
//!   keeps reading the same element.
//! - `backstrides[i] = strides[i] * (shape[i] - 1)`, the distance walked by
//!   a stepper from the first to the last index of axis `i`.
//! - Multi-indices are right-aligned against shapes: an index longer than
//!   the rank drops its leading entries, a shorter one addresses the
//!   trailing axes.

use crate::layout::Layout;
use crate::shape::{Shape, Strides};
use crate::{Result, XtensorError};

/// Fill `strides` for `shape` in the given layout and return the element count.
///
/// `Dynamic` and `Any` are computed as [`crate::DEFAULT_LAYOUT`].
pub fn compute_strides(shape: &[usize], layout: Layout, strides: &mut [isize]) -> usize {
    debug_assert_eq!(shape.len(), strides.len());
    let mut data_size = 1usize;
    let mut visit = |i: usize| {
        strides[i] = if shape[i] == 1 { 0 } else { data_size as isize };
        data_size *= shape[i];
    };
    match layout.storage_order() {
        Layout::ColumnMajor => (0..shape.len()).for_each(&mut visit),
        _ => (0..shape.len()).rev().for_each(&mut visit),
    }
    data_size
}

/// Fill `backstrides` from `shape` and `strides`.
pub fn compute_backstrides(shape: &[usize], strides: &[isize], backstrides: &mut [isize]) {
    for ((b, &n), &s) in backstrides.iter_mut().zip(shape).zip(strides) {
        *b = if n == 0 { 0 } else { s * (n as isize - 1) };
    }
}

/// Number of elements of `shape`; 1 for the rank-0 shape.
#[inline]
pub fn compute_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Zero the strides of size-1 axes and recompute backstrides.
///
/// Caller-supplied strides go through this so that broadcast reads over
/// size-1 axes stay on the single element.
pub fn adapt_strides(shape: &[usize], strides: &mut [isize], backstrides: &mut [isize]) {
    for (s, &n) in strides.iter_mut().zip(shape) {
        if n == 1 {
            *s = 0;
        }
    }
    compute_backstrides(shape, strides, backstrides);
}

/// Linear offset of a right-aligned multi-index.
#[inline]
pub fn data_offset(strides: &[isize], index: &[usize]) -> isize {
    let n = strides.len().min(index.len());
    strides[strides.len() - n..]
        .iter()
        .zip(&index[index.len() - n..])
        .map(|(&s, &i)| s * i as isize)
        .sum()
}

/// Multi-index of the `flat`-th element when traversing `shape` in `layout`.
pub fn unravel_index(flat: usize, shape: &[usize], layout: Layout) -> Shape {
    let mut index = Shape::with_len(shape.len());
    let mut rest = flat;
    let mut visit = |i: usize| {
        let n = shape[i].max(1);
        index[i] = rest % n;
        rest /= n;
    };
    match layout.storage_order() {
        Layout::ColumnMajor => (0..shape.len()).for_each(&mut visit),
        _ => (0..shape.len()).rev().for_each(&mut visit),
    }
    index
}

/// Position of `index` when traversing `shape` in `layout`.
pub fn ravel_index(index: &[usize], shape: &[usize], layout: Layout) -> Result<usize> {
    check_index(index, shape)?;
    let mut flat = 0usize;
    let mut visit = |i: usize| flat = flat * shape[i] + index[i];
    match layout.storage_order() {
        Layout::ColumnMajor => (0..shape.len()).rev().for_each(&mut visit),
        _ => (0..shape.len()).for_each(&mut visit),
    }
    Ok(flat)
}

/// Whether `strides` are the dense strides of `shape` in `layout`.
pub fn is_contiguous(shape: &[usize], strides: &[isize], layout: Layout) -> bool {
    let mut expected = Strides::from_elem(0, shape.len());
    compute_strides(shape, layout, &mut expected);
    shape
        .iter()
        .zip(strides.iter().zip(expected.iter()))
        .all(|(&n, (&s, &e))| n == 1 || s == e)
}

/// Check that `index` addresses an element of `shape`.
pub(crate) fn check_index(index: &[usize], shape: &[usize]) -> Result<()> {
    if index.len() != shape.len() || index.iter().zip(shape).any(|(&i, &n)| i >= n) {
        return Err(XtensorError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: shape.to_vec(),
        });
    }
    Ok(())
}

/// Advance a row-major counter over `shape`; false once every index was visited.
#[inline]
pub(crate) fn next_index(index: &mut [usize], shape: &[usize]) -> bool {
    for d in (0..shape.len()).rev() {
        index[d] += 1;
        if index[d] < shape[d] {
            return true;
        }
        index[d] = 0;
    }
    false
}

/// Offsets of the lowest and highest element reached from offset 0.
///
/// Each axis contributes its backstride `stride * (extent - 1)` to the low
/// end when negative and to the high end otherwise. `None` for an empty
/// shape, which reaches no element at all.
fn backstride_span(shape: &[usize], strides: &[isize]) -> Result<Option<(isize, isize)>> {
    if shape.len() != strides.len() {
        return Err(XtensorError::StrideLengthMismatch);
    }
    if shape.contains(&0) {
        return Ok(None);
    }
    let mut span = (0isize, 0isize);
    for (&n, &s) in shape.iter().zip(strides) {
        let back = isize::try_from(n - 1)
            .ok()
            .and_then(|extent| s.checked_mul(extent))
            .ok_or(XtensorError::OffsetOverflow)?;
        let end = if back < 0 { &mut span.0 } else { &mut span.1 };
        *end = end.checked_add(back).ok_or(XtensorError::OffsetOverflow)?;
    }
    Ok(Some(span))
}

/// Check that a view starting at `offset` stays inside a buffer of `len`.
pub(crate) fn check_span(len: usize, shape: &[usize], strides: &[isize], offset: isize) -> Result<()> {
    let Some((low, high)) = backstride_span(shape, strides)? else {
        return Ok(());
    };
    let first = offset.checked_add(low).ok_or(XtensorError::OffsetOverflow)?;
    let last = offset.checked_add(high).ok_or(XtensorError::OffsetOverflow)?;
    if first < 0 || last < 0 || last as usize >= len {
        return Err(XtensorError::OffsetOverflow);
    }
    Ok(())
}

/// Storage length needed by non-negative `strides` over `shape`.
pub(crate) fn required_len(shape: &[usize], strides: &[isize]) -> Result<usize> {
    if let Some(axis) = strides.iter().position(|&s| s < 0) {
        return Err(XtensorError::NegativeStride { axis });
    }
    Ok(backstride_span(shape, strides)?.map_or(0, |(_, high)| high as usize + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strides_of(shape: &[usize], layout: Layout) -> Vec<isize> {
        let mut s = vec![0; shape.len()];
        compute_strides(shape, layout, &mut s);
        s
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(strides_of(&[3, 4], Layout::RowMajor), vec![4, 1]);
        assert_eq!(strides_of(&[2, 3, 4], Layout::RowMajor), vec![12, 4, 1]);
    }

    #[test]
    fn test_col_major_strides() {
        assert_eq!(strides_of(&[3, 4], Layout::ColumnMajor), vec![1, 3]);
        assert_eq!(strides_of(&[2, 3, 4], Layout::ColumnMajor), vec![1, 2, 6]);
    }

    #[test]
    fn test_size_one_axis_has_zero_stride() {
        assert_eq!(strides_of(&[3, 1, 2], Layout::RowMajor), vec![2, 0, 1]);
        assert_eq!(strides_of(&[1, 5], Layout::ColumnMajor), vec![0, 1]);
    }

    #[test]
    fn test_compute_size() {
        assert_eq!(compute_size(&[]), 1);
        assert_eq!(compute_size(&[2, 3, 4]), 24);
        assert_eq!(compute_size(&[2, 0, 4]), 0);
        let mut s = [];
        assert_eq!(compute_strides(&[], Layout::RowMajor, &mut s), 1);
    }

    #[test]
    fn test_backstrides() {
        let shape = [2, 3, 4];
        let strides = strides_of(&shape, Layout::RowMajor);
        let mut back = [0; 3];
        compute_backstrides(&shape, &strides, &mut back);
        assert_eq!(back, [12, 8, 3]);
    }

    #[test]
    fn test_adapt_strides() {
        let shape = [2, 1, 3];
        let mut strides = [3, 3, 1];
        let mut back = [0; 3];
        adapt_strides(&shape, &mut strides, &mut back);
        assert_eq!(strides, [3, 0, 1]);
        assert_eq!(back, [3, 0, 2]);
    }

    #[test]
    fn test_data_offset_alignment() {
        let strides = [12, 4, 1];
        assert_eq!(data_offset(&strides, &[1, 2, 3]), 23);
        assert_eq!(data_offset(&strides, &[2, 3]), 11);
        assert_eq!(data_offset(&strides, &[9, 1, 2, 3]), 23);
        assert_eq!(data_offset(&strides, &[]), 0);
    }

    #[test]
    fn test_unravel_ravel() {
        let shape = [2, 3, 4];
        for layout in [Layout::RowMajor, Layout::ColumnMajor] {
            for flat in 0..24 {
                let idx = unravel_index(flat, &shape, layout);
                assert_eq!(ravel_index(&idx, &shape, layout).unwrap(), flat);
            }
        }
        assert_eq!(unravel_index(5, &shape, Layout::RowMajor), [0, 1, 1]);
        assert_eq!(unravel_index(5, &shape, Layout::ColumnMajor), [1, 2, 0]);
        assert!(ravel_index(&[2, 0, 0], &shape, Layout::RowMajor).is_err());
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[2, 3], &[3, 1], Layout::RowMajor));
        assert!(!is_contiguous(&[2, 3], &[1, 2], Layout::RowMajor));
        assert!(is_contiguous(&[2, 3], &[1, 2], Layout::ColumnMajor));
    }

    #[test]
    fn test_next_index() {
        let shape = [2, 2];
        let mut idx = [0, 0];
        let mut seen = vec![idx];
        while next_index(&mut idx, &shape) {
            seen.push(idx);
        }
        assert_eq!(seen, vec![[0, 0], [0, 1], [1, 0], [1, 1]]);
    }

    #[test]
    fn test_check_span() {
        assert!(check_span(6, &[2, 3], &[3, 1], 0).is_ok());
        assert!(check_span(5, &[2, 3], &[3, 1], 0).is_err());
        assert!(check_span(6, &[2, 3], &[-3, 1], 3).is_ok());
        assert!(check_span(6, &[2, 3], &[-3, 1], 2).is_err());
        assert!(check_span(0, &[4, 0], &[1, 1], 0).is_ok());
        assert!(matches!(
            check_span(6, &[2], &[3, 1], 0),
            Err(XtensorError::StrideLengthMismatch)
        ));
        assert!(matches!(
            check_span(usize::MAX, &[3], &[isize::MAX], 0),
            Err(XtensorError::OffsetOverflow)
        ));
    }

    #[test]
    fn test_required_len() {
        assert_eq!(required_len(&[2, 3], &[3, 1]).unwrap(), 6);
        assert_eq!(required_len(&[2, 3], &[4, 1]).unwrap(), 7);
        assert_eq!(required_len(&[0, 3], &[4, 1]).unwrap(), 0);
        assert!(matches!(
            required_len(&[2, 3], &[-3, 1]),
            Err(XtensorError::NegativeStride { axis: 0 })
        ));
    }
}
