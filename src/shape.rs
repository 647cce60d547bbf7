//! Shape representations: dynamic, static rank and compile-time fixed.
//!
//! A container is parameterised by a [`Dimension`] marker choosing how its
//! shape is stored:
//!
//! - [`Dyn`]: runtime rank, shape kept in a small vector ([`Shape`])
//! - [`Rank<N>`]: rank fixed at compile time, shape in `[usize; N]`
//! - [`Fixed<F>`]: the whole shape fixed at compile time by a
//!   [`FixedShape`] descriptor such as `Fix2<2, 3>`
//!
//! Fixed descriptors carry their size and strides as associated constants
//! computed by `const fn`, so a fixed container never computes strides at
//! run time. [`broadcast_fixed`] broadcasts fixed shapes during constant
//! evaluation: a mismatch is a compile error when the result is bound to a
//! `const`.

use std::fmt;

use crate::layout::Layout;
use crate::storage::SVector;
use crate::strides::{compute_backstrides, compute_strides};
use crate::{Result, XtensorError};

/// Dynamic shape; ranks up to [`crate::SVECTOR_INLINE`] stay inline.
pub type Shape = SVector<usize>;

/// Dynamic strides or backstrides.
pub type Strides = SVector<isize>;

// ============================================================================
// Dimension kinds
// ============================================================================

/// How a container stores its shape.
pub trait Dimension: Clone + Copy + Default + fmt::Debug + 'static {
    type Shape: Clone + fmt::Debug + AsRef<[usize]>;
    type Strides: Clone + fmt::Debug + AsRef<[isize]> + AsMut<[isize]>;

    /// Whether the shape is a compile-time constant.
    const FIXED: bool = false;

    /// Convert a runtime shape, checking rank (and extents for fixed shapes).
    fn shape_from_slice(shape: &[usize]) -> Result<Self::Shape>;

    /// Zeroed strides of the given rank.
    fn zero_strides(rank: usize) -> Self::Strides;

    /// Strides and backstrides of `shape` in `layout`.
    fn layout_strides(shape: &Self::Shape, layout: Layout) -> (Self::Strides, Self::Strides) {
        let shape = shape.as_ref();
        let mut strides = Self::zero_strides(shape.len());
        let mut backstrides = Self::zero_strides(shape.len());
        compute_strides(shape, layout, strides.as_mut());
        compute_backstrides(shape, strides.as_ref(), backstrides.as_mut());
        (strides, backstrides)
    }
}

/// Runtime rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dyn;

/// Rank `N` known at compile time, extents at run time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rank<const N: usize>;

/// Shape fixed at compile time by the descriptor `F`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fixed<F>(F);

impl Dimension for Dyn {
    type Shape = Shape;
    type Strides = Strides;

    fn shape_from_slice(shape: &[usize]) -> Result<Shape> {
        Ok(Shape::from_slice(shape))
    }

    fn zero_strides(rank: usize) -> Strides {
        Strides::from_elem(0, rank)
    }
}

impl<const N: usize> Dimension for Rank<N> {
    type Shape = [usize; N];
    type Strides = [isize; N];

    fn shape_from_slice(shape: &[usize]) -> Result<[usize; N]> {
        shape
            .try_into()
            .map_err(|_| XtensorError::RankMismatch(N, shape.len()))
    }

    fn zero_strides(_rank: usize) -> [isize; N] {
        [0; N]
    }
}

impl<F: FixedShape> Dimension for Fixed<F> {
    type Shape = F;
    type Strides = Strides;

    const FIXED: bool = true;

    fn shape_from_slice(shape: &[usize]) -> Result<F> {
        if shape == F::SHAPE {
            Ok(F::default())
        } else {
            Err(XtensorError::FixedShape {
                fixed: F::SHAPE.to_vec(),
                requested: shape.to_vec(),
            })
        }
    }

    fn zero_strides(rank: usize) -> Strides {
        Strides::from_elem(0, rank)
    }

    fn layout_strides(_shape: &F, layout: Layout) -> (Strides, Strides) {
        let strides = match layout.storage_order() {
            Layout::ColumnMajor => Strides::from_slice(F::COLUMN_MAJOR_STRIDES),
            _ => Strides::from_slice(F::ROW_MAJOR_STRIDES),
        };
        let mut backstrides = Strides::from_elem(0, F::RANK);
        compute_backstrides(F::SHAPE, &strides, &mut backstrides);
        (strides, backstrides)
    }
}

// ============================================================================
// Compile-time shapes
// ============================================================================

/// A shape known at compile time.
///
/// Implemented by the zero-sized descriptors [`Fix1`] .. [`Fix4`]. All
/// associated constants are evaluated by the compiler.
pub trait FixedShape: Copy + Default + fmt::Debug + AsRef<[usize]> + 'static {
    const SHAPE: &'static [usize];
    const RANK: usize = Self::SHAPE.len();
    const SIZE: usize = fixed_size(Self::SHAPE);
    const ROW_MAJOR_STRIDES: &'static [isize];
    const COLUMN_MAJOR_STRIDES: &'static [isize];
}

/// Product of the extents; 1 for the rank-0 shape.
pub const fn fixed_size(shape: &[usize]) -> usize {
    let mut size = 1;
    let mut i = 0;
    while i < shape.len() {
        size *= shape[i];
        i += 1;
    }
    size
}

/// Strides of a fixed shape.
///
/// Row-major: the stride of axis `i` is the product of the extents strictly
/// to its right; column-major mirrors it. Size-1 axes get stride 0.
pub const fn fixed_strides<const R: usize>(shape: [usize; R], row_major: bool) -> [isize; R] {
    let mut strides = [0isize; R];
    let mut size = 1usize;
    let mut k = 0;
    while k < R {
        let i = if row_major { R - 1 - k } else { k };
        strides[i] = if shape[i] == 1 { 0 } else { size as isize };
        size *= shape[i];
        k += 1;
    }
    strides
}

/// Broadcast two fixed shapes during constant evaluation.
///
/// `O` must be the larger of the two ranks. Incompatible extents abort
/// constant evaluation, which turns the mismatch into a compile error:
///
/// ```compile_fail
/// const BAD: [usize; 2] = xtensor::broadcast_fixed([2, 3], [4, 3]);
/// assert_eq!(BAD.len(), 2);
/// ```
///
/// ```
/// const OUT: [usize; 3] = xtensor::broadcast_fixed([3, 1], [2, 1, 4]);
/// assert_eq!(OUT, [2, 3, 4]);
/// ```
pub const fn broadcast_fixed<const L: usize, const R: usize, const O: usize>(
    lhs: [usize; L],
    rhs: [usize; R],
) -> [usize; O] {
    assert!(
        O == if L > R { L } else { R },
        "output rank must equal the larger input rank"
    );
    let mut out = [1usize; O];
    let mut k = 0;
    while k < O {
        let a = if k < L { lhs[L - 1 - k] } else { 1 };
        let b = if k < R { rhs[R - 1 - k] } else { 1 };
        out[O - 1 - k] = if a == b || b == 1 {
            a
        } else if a == 1 {
            b
        } else {
            panic!("fixed shapes cannot be broadcast together")
        };
        k += 1;
    }
    out
}

macro_rules! fixed_shape {
    ($(#[$doc:meta])* $name:ident<$($d:ident),+>, $rank:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name<$(const $d: usize),+>;

        impl<$(const $d: usize),+> FixedShape for $name<$($d),+> {
            const SHAPE: &'static [usize] = &[$($d),+];
            const ROW_MAJOR_STRIDES: &'static [isize] = &fixed_strides::<$rank>([$($d),+], true);
            const COLUMN_MAJOR_STRIDES: &'static [isize] =
                &fixed_strides::<$rank>([$($d),+], false);
        }

        impl<$(const $d: usize),+> AsRef<[usize]> for $name<$($d),+> {
            #[inline]
            fn as_ref(&self) -> &[usize] {
                Self::SHAPE
            }
        }
    };
}

fixed_shape!(
    /// Fixed 1-d shape `(A)`.
    Fix1<A>, 1
);
fixed_shape!(
    /// Fixed 2-d shape `(A, B)`.
    Fix2<A, B>, 2
);
fixed_shape!(
    /// Fixed 3-d shape `(A, B, C)`.
    Fix3<A, B, C>, 3
);
fixed_shape!(
    /// Fixed 4-d shape `(A, B, C, D)`.
    Fix4<A, B, C, D>, 4
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        type S = Fix3<2, 3, 4>;
        assert_eq!(S::SHAPE, &[2, 3, 4]);
        assert_eq!(S::RANK, 3);
        assert_eq!(S::SIZE, 24);
        assert_eq!(S::ROW_MAJOR_STRIDES, &[12, 4, 1]);
        assert_eq!(S::COLUMN_MAJOR_STRIDES, &[1, 2, 6]);
        assert_eq!(Fix2::<3, 1>::ROW_MAJOR_STRIDES, &[1, 0]);
    }

    #[test]
    fn test_fixed_strides_match_runtime() {
        const SHAPE: [usize; 4] = [3, 1, 2, 5];
        const ROW: [isize; 4] = fixed_strides(SHAPE, true);
        const COL: [isize; 4] = fixed_strides(SHAPE, false);
        let mut row = [0; 4];
        let mut col = [0; 4];
        compute_strides(&SHAPE, Layout::RowMajor, &mut row);
        compute_strides(&SHAPE, Layout::ColumnMajor, &mut col);
        assert_eq!(ROW, row);
        assert_eq!(COL, col);
    }

    #[test]
    fn test_broadcast_fixed() {
        const A: [usize; 2] = broadcast_fixed([3, 1], [1, 4]);
        const B: [usize; 3] = broadcast_fixed([4], [2, 3, 1]);
        assert_eq!(A, [3, 4]);
        assert_eq!(B, [2, 3, 4]);
        assert_eq!(fixed_size(&[]), 1);
    }

    #[test]
    fn test_dimension_shape_from_slice() {
        assert_eq!(Dyn::shape_from_slice(&[2, 3]).unwrap(), [2, 3]);
        assert_eq!(Rank::<2>::shape_from_slice(&[2, 3]).unwrap(), [2, 3]);
        assert_eq!(
            Rank::<3>::shape_from_slice(&[2, 3]).unwrap_err(),
            XtensorError::RankMismatch(3, 2)
        );
        assert!(Fixed::<Fix2<2, 3>>::shape_from_slice(&[2, 3]).is_ok());
        assert!(matches!(
            Fixed::<Fix2<2, 3>>::shape_from_slice(&[3, 2]),
            Err(XtensorError::FixedShape { .. })
        ));
    }

    #[test]
    fn test_layout_strides() {
        let (s, b) = Dyn::layout_strides(&Shape::from([2, 3]), Layout::ColumnMajor);
        assert_eq!(s, [1, 2]);
        assert_eq!(b, [1, 4]);
        let (s, b) = Fixed::<Fix2<2, 3>>::layout_strides(&Fix2, Layout::RowMajor);
        assert_eq!(s, [3, 1]);
        assert_eq!(b, [3, 2]);
    }
}
