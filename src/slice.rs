//! Slice arguments and the stride arithmetic of sliced views.
//!
//! A view over strided memory is fully described by its dims, strides and
//! base offset. Slicing, flipping and inserting or removing unit axes only
//! rewrite that triple:
//!
//! - an index fixes an axis: `offset += i * stride` and the axis is dropped
//! - a range keeps the axis with extent `ceil((stop - start) / step)`,
//!   `offset += start * stride` and `stride *= step`
//! - a new axis inserts extent 1 with stride 0
//!
//! Negative bounds count from the end of the axis. Range bounds are clamped
//! to the axis the way Python slices are, so `(-100..100)` over an axis of
//! 5 selects all 5 elements.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::shape::{Shape, Strides};
use crate::{Result, XtensorError};

/// One entry of a slice argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    /// Select a single index and drop the axis. Negative counts from the end.
    Index(isize),
    /// Select `start, start + step, ...` up to but excluding `stop`.
    ///
    /// Missing bounds default to the whole axis in the direction of `step`.
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
    /// Insert an axis of extent 1.
    NewAxis,
    /// Stands for as many full ranges as needed to cover the remaining axes.
    Ellipsis,
}

impl Slice {
    /// The whole axis.
    pub const fn all() -> Self {
        Slice::Range {
            start: None,
            stop: None,
            step: 1,
        }
    }

    /// `start..stop` with unit step.
    pub const fn range(start: isize, stop: isize) -> Self {
        Slice::Range {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// `start..stop` every `step` elements.
    pub const fn stepped(start: isize, stop: isize, step: isize) -> Self {
        Slice::Range {
            start: Some(start),
            stop: Some(stop),
            step,
        }
    }

    /// The whole axis every `step` elements; a negative step walks it backwards.
    pub const fn every(step: isize) -> Self {
        Slice::Range {
            start: None,
            stop: None,
            step,
        }
    }

    fn consumes_axis(&self) -> bool {
        matches!(self, Slice::Index(_) | Slice::Range { .. })
    }
}

macro_rules! impl_slice_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Slice {
                #[inline]
                fn from(i: $t) -> Self {
                    Slice::Index(i as isize)
                }
            }

            impl From<Range<$t>> for Slice {
                #[inline]
                fn from(r: Range<$t>) -> Self {
                    Slice::range(r.start as isize, r.end as isize)
                }
            }

            impl From<RangeFrom<$t>> for Slice {
                #[inline]
                fn from(r: RangeFrom<$t>) -> Self {
                    Slice::Range {
                        start: Some(r.start as isize),
                        stop: None,
                        step: 1,
                    }
                }
            }

            impl From<RangeTo<$t>> for Slice {
                #[inline]
                fn from(r: RangeTo<$t>) -> Self {
                    Slice::Range {
                        start: None,
                        stop: Some(r.end as isize),
                        step: 1,
                    }
                }
            }
        )*
    };
}

impl_slice_from!(isize, usize, i32);

impl From<RangeFull> for Slice {
    #[inline]
    fn from(_: RangeFull) -> Self {
        Slice::all()
    }
}

/// Build a `[Slice; N]` from indices and ranges.
///
/// ```rust
/// use xtensor::{s, Slice, XArray};
///
/// let a = XArray::from_shape_vec(&[3, 4], (0..12).collect()).unwrap();
/// let v = a.slice(&s![1.., Slice::every(-2)]).unwrap();
/// assert_eq!(v.dims(), &[2, 2]);
/// assert_eq!(v.at(&[0, 0]).unwrap(), 7);
/// ```
#[macro_export]
macro_rules! s {
    ($($e:expr),* $(,)?) => {
        [$($crate::Slice::from($e)),*]
    };
}

// ============================================================================
// Window arithmetic
// ============================================================================

/// Dims, strides and base offset of a view.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Window {
    pub(crate) dims: Shape,
    pub(crate) strides: Strides,
    pub(crate) offset: isize,
}

/// First index and extent of a range over an axis of `extent`.
fn stepped_range(
    extent: usize,
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
) -> Result<(isize, usize)> {
    if step == 0 {
        return Err(XtensorError::ZeroStep);
    }
    let n = extent as isize;
    let normalize = |bound: isize, low: isize, high: isize| {
        let bound = if bound < 0 { bound + n } else { bound };
        bound.clamp(low, high)
    };
    let (first, len) = if step > 0 {
        let first = start.map_or(0, |b| normalize(b, 0, n));
        let stop = stop.map_or(n, |b| normalize(b, 0, n));
        (first, (stop - first).max(0) as usize)
    } else {
        let first = start.map_or(n - 1, |b| normalize(b, -1, n - 1));
        let stop = stop.map_or(-1, |b| normalize(b, -1, n - 1));
        (first, (first - stop).max(0) as usize)
    };
    Ok((first, len.div_ceil(step.unsigned_abs())))
}

impl Window {
    pub(crate) fn new(dims: &[usize], strides: &[isize], offset: isize) -> Self {
        Self {
            dims: Shape::from_slice(dims),
            strides: Strides::from_slice(strides),
            offset,
        }
    }

    fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.dims.len() {
            return Err(XtensorError::InvalidAxis {
                axis,
                rank: self.dims.len(),
            });
        }
        Ok(())
    }

    /// Apply a slice argument. Axes not covered by `slices` are kept whole.
    pub(crate) fn slice(&self, slices: &[Slice]) -> Result<Window> {
        let rank = self.dims.len();
        let consumed = slices.iter().filter(|s| s.consumes_axis()).count();
        if consumed > rank {
            return Err(XtensorError::TooManySlices {
                count: consumed,
                rank,
            });
        }
        if slices.iter().filter(|s| **s == Slice::Ellipsis).count() > 1 {
            return Err(XtensorError::MultipleEllipsis);
        }

        let mut out = Window::new(&[], &[], self.offset);
        let mut axis = 0;
        let keep_whole = |out: &mut Window, axis: &mut usize, count: usize| {
            for _ in 0..count {
                out.dims.push(self.dims[*axis]);
                out.strides.push(self.strides[*axis]);
                *axis += 1;
            }
        };
        for slice in slices {
            match *slice {
                Slice::Index(i) => {
                    let n = self.dims[axis];
                    let index = if i < 0 { i + n as isize } else { i };
                    if index < 0 || index >= n as isize {
                        return Err(XtensorError::SliceOutOfBounds {
                            axis,
                            index: i,
                            extent: n,
                        });
                    }
                    out.offset += index * self.strides[axis];
                    axis += 1;
                }
                Slice::Range { start, stop, step } => {
                    let (first, len) = stepped_range(self.dims[axis], start, stop, step)?;
                    if len > 0 {
                        out.offset += first * self.strides[axis];
                    }
                    out.dims.push(len);
                    out.strides.push(self.strides[axis] * step);
                    axis += 1;
                }
                Slice::NewAxis => {
                    out.dims.push(1);
                    out.strides.push(0);
                }
                Slice::Ellipsis => keep_whole(&mut out, &mut axis, rank - consumed),
            }
        }
        let remaining = rank - axis;
        keep_whole(&mut out, &mut axis, remaining);
        Ok(out)
    }

    /// Drop every axis of extent 1.
    pub(crate) fn squeeze(&self) -> Window {
        let mut out = Window::new(&[], &[], self.offset);
        for (&n, &s) in self.dims.iter().zip(self.strides.iter()) {
            if n != 1 {
                out.dims.push(n);
                out.strides.push(s);
            }
        }
        out
    }

    /// Drop the listed axes, each of which must have extent 1.
    pub(crate) fn squeeze_axes(&self, axes: &[usize]) -> Result<Window> {
        let mut drop = vec![false; self.dims.len()];
        for &axis in axes {
            self.check_axis(axis)?;
            if drop[axis] {
                return Err(XtensorError::DuplicateAxis(axis));
            }
            if self.dims[axis] != 1 {
                return Err(XtensorError::NotSqueezable {
                    axis,
                    extent: self.dims[axis],
                });
            }
            drop[axis] = true;
        }
        let mut out = Window::new(&[], &[], self.offset);
        for (d, (&n, &s)) in self.dims.iter().zip(self.strides.iter()).enumerate() {
            if !drop[d] {
                out.dims.push(n);
                out.strides.push(s);
            }
        }
        Ok(out)
    }

    /// Insert an axis of extent 1 so that it becomes axis `axis`.
    pub(crate) fn expand_dims(&self, axis: usize) -> Result<Window> {
        if axis > self.dims.len() {
            return Err(XtensorError::InvalidAxis {
                axis,
                rank: self.dims.len() + 1,
            });
        }
        let mut out = self.clone();
        out.dims.insert(axis, 1);
        out.strides.insert(axis, 0);
        Ok(out)
    }

    /// Reverse the order of elements along `axis`.
    pub(crate) fn flip(&self, axis: usize) -> Result<Window> {
        self.check_axis(axis)?;
        let mut out = self.clone();
        let n = self.dims[axis];
        if n > 0 {
            out.offset += (n as isize - 1) * self.strides[axis];
        }
        out.strides[axis] = -self.strides[axis];
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(dims: &[usize], strides: &[isize]) -> Window {
        Window::new(dims, strides, 0)
    }

    #[test]
    fn test_stepped_range_forward() {
        assert_eq!(stepped_range(10, None, None, 1).unwrap(), (0, 10));
        assert_eq!(stepped_range(10, Some(2), Some(8), 3).unwrap(), (2, 2));
        assert_eq!(stepped_range(10, Some(-3), None, 1).unwrap(), (7, 3));
        assert_eq!(stepped_range(5, Some(-100), Some(100), 1).unwrap(), (0, 5));
        assert_eq!(stepped_range(5, Some(4), Some(2), 1).unwrap().1, 0);
    }

    #[test]
    fn test_stepped_range_backward() {
        assert_eq!(stepped_range(5, None, None, -1).unwrap(), (4, 5));
        assert_eq!(stepped_range(5, None, None, -2).unwrap(), (4, 3));
        assert_eq!(stepped_range(5, Some(3), Some(0), -1).unwrap(), (3, 3));
        // an explicit -1 stop is the last element, not "before the first"
        assert_eq!(stepped_range(5, None, Some(-1), -1).unwrap().1, 0);
        assert_eq!(stepped_range(0, None, None, -1).unwrap().1, 0);
    }

    #[test]
    fn test_zero_step_rejected() {
        assert_eq!(stepped_range(5, None, None, 0), Err(XtensorError::ZeroStep));
    }

    #[test]
    fn test_slice_offsets_and_strides() {
        let w = window(&[4, 6], &[6, 1]);
        let s = w.slice(&[Slice::Index(1), Slice::stepped(1, 6, 2)]).unwrap();
        assert_eq!(s.dims.as_slice(), &[3]);
        assert_eq!(s.strides.as_slice(), &[2]);
        assert_eq!(s.offset, 7);

        let r = w.slice(&[Slice::every(-1)]).unwrap();
        assert_eq!(r.dims.as_slice(), &[4, 6]);
        assert_eq!(r.strides.as_slice(), &[-6, 1]);
        assert_eq!(r.offset, 18);
    }

    #[test]
    fn test_slice_ellipsis_and_newaxis() {
        let w = window(&[2, 3, 4], &[12, 4, 1]);
        let s = w
            .slice(&[Slice::Ellipsis, Slice::NewAxis, Slice::Index(-1)])
            .unwrap();
        assert_eq!(s.dims.as_slice(), &[2, 3, 1]);
        assert_eq!(s.strides.as_slice(), &[12, 4, 0]);
        assert_eq!(s.offset, 3);

        let t = w.slice(&[Slice::NewAxis, Slice::Index(1)]).unwrap();
        assert_eq!(t.dims.as_slice(), &[1, 3, 4]);
        assert_eq!(t.offset, 12);
    }

    #[test]
    fn test_slice_errors() {
        let w = window(&[2, 3], &[3, 1]);
        assert_eq!(
            w.slice(&[Slice::Index(0), Slice::Index(0), Slice::Index(0)]),
            Err(XtensorError::TooManySlices { count: 3, rank: 2 })
        );
        assert_eq!(
            w.slice(&[Slice::Ellipsis, Slice::Ellipsis]),
            Err(XtensorError::MultipleEllipsis)
        );
        assert_eq!(
            w.slice(&[Slice::Index(0), Slice::Index(-4)]),
            Err(XtensorError::SliceOutOfBounds {
                axis: 1,
                index: -4,
                extent: 3
            })
        );
    }

    #[test]
    fn test_empty_range_keeps_offset() {
        let w = Window::new(&[3], &[1], 2);
        let s = w.slice(&[Slice::range(5, 9)]).unwrap();
        assert_eq!(s.dims.as_slice(), &[0]);
        assert_eq!(s.offset, 2);
    }

    #[test]
    fn test_squeeze_expand_flip() {
        let w = window(&[1, 3, 1], &[0, 1, 0]);
        assert_eq!(w.squeeze().dims.as_slice(), &[3]);
        assert_eq!(w.squeeze_axes(&[2]).unwrap().dims.as_slice(), &[1, 3]);
        assert_eq!(
            w.squeeze_axes(&[1]),
            Err(XtensorError::NotSqueezable { axis: 1, extent: 3 })
        );
        assert_eq!(w.squeeze_axes(&[0, 0]), Err(XtensorError::DuplicateAxis(0)));

        let e = window(&[2, 3], &[3, 1]).expand_dims(2).unwrap();
        assert_eq!(e.dims.as_slice(), &[2, 3, 1]);
        assert!(window(&[2, 3], &[3, 1]).expand_dims(3).is_err());

        let f = window(&[2, 3], &[3, 1]).flip(1).unwrap();
        assert_eq!(f.strides.as_slice(), &[3, -1]);
        assert_eq!(f.offset, 2);
        assert!(window(&[2, 3], &[3, 1]).flip(2).is_err());
    }

    #[test]
    fn test_slice_macro_converts_entries() {
        let n: usize = 3;
        let args = s![1, ..n, -2.., ..];
        assert_eq!(args[0], Slice::Index(1));
        assert_eq!(args[1], Slice::Range { start: None, stop: Some(3), step: 1 });
        assert_eq!(args[2], Slice::Range { start: Some(-2), stop: None, step: 1 });
        assert_eq!(args[3], Slice::all());
    }
}
