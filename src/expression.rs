//! The lazy expression protocol.
//!
//! Every array-like participates in expressions through [`Expression`]:
//! containers, views, elementwise functions, broadcasts, reducers and
//! scalars. An expression never stores its shape; it merges its operands'
//! shapes into a caller-provided buffer on demand.
//!
//! Evaluation reads elements one of three ways:
//!
//! - `linear(i)`: the `i`-th element in the destination's memory order,
//!   only valid when [`Expression::is_trivial_broadcast`] held for the
//!   destination strides
//! - [`Stepper`]: an incremental cursor moved one axis at a time
//! - `element(index)`: random access by a right-aligned multi-index

use crate::broadcast::UNSET;
use crate::shape::Shape;
use crate::strides::compute_size;
use crate::Result;

// ============================================================================
// Expression
// ============================================================================

/// An array-like value that can be evaluated lazily.
pub trait Expression {
    /// Element type produced by evaluation.
    type Elem: Copy;

    /// Cursor type returned by [`Expression::stepper`].
    type Stepper<'s>: Stepper<Elem = Self::Elem>
    where
        Self: 's;

    /// Number of axes.
    fn dimension(&self) -> usize;

    /// Merge this expression's shape into `shape` (right-aligned).
    ///
    /// Returns whether the merge was trivial for every operand.
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool>;

    /// Whether every leaf shares `strides`, so that `linear` is valid.
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool;

    /// Element at a right-aligned multi-index.
    ///
    /// Entries of `index` beyond this expression's rank address broadcast
    /// axes and are dropped; size-1 axes ignore their index.
    fn element(&self, index: &[usize]) -> Self::Elem;

    /// Element at flat position `i` of a destination with matching strides.
    fn linear(&self, i: usize) -> Self::Elem;

    /// Stepper positioned at the first element, driven in a destination of
    /// rank `rank >= self.dimension()`.
    fn stepper(&self, rank: usize) -> Self::Stepper<'_>;

    /// Broadcast shape of this expression.
    fn shape(&self) -> Result<Shape> {
        let mut shape = Shape::from_elem(UNSET, self.dimension());
        self.broadcast_shape(&mut shape)?;
        Ok(shape)
    }

    /// Iterate the elements in row-major order of the broadcast shape.
    fn iter(&self) -> Result<ExprIter<'_, Self>>
    where
        Self: Sized,
    {
        ExprIter::new(self)
    }
}

impl<E: Expression + ?Sized> Expression for &E {
    type Elem = E::Elem;
    type Stepper<'s> = E::Stepper<'s> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    #[inline]
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        (**self).broadcast_shape(shape)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        (**self).is_trivial_broadcast(strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> E::Elem {
        (**self).element(index)
    }

    #[inline]
    fn linear(&self, i: usize) -> E::Elem {
        (**self).linear(i)
    }

    #[inline]
    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        (**self).stepper(rank)
    }
}

// ============================================================================
// Stepper
// ============================================================================

/// Incremental cursor over an expression.
///
/// Axes are numbered in the destination's rank. A stepper whose
/// expression has fewer axes ignores the leading ones; broadcast (size-1)
/// axes neither move nor reset.
pub trait Stepper {
    type Elem;

    /// Advance one position along axis `dim`.
    fn step(&mut self, dim: usize);

    /// Return from the last position of axis `dim` to its first.
    fn reset(&mut self, dim: usize);

    /// Element under the cursor.
    fn value(&self) -> Self::Elem;
}

/// Number of leading destination axes a stepper of rank `own` skips.
#[inline]
pub(crate) fn stepper_offset(rank: usize, own: usize) -> usize {
    debug_assert!(rank >= own, "stepper rank {rank} below expression rank {own}");
    rank - own
}

// ============================================================================
// Scalars
// ============================================================================

/// A single value broadcast to any shape.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scalar<T>(pub T);

impl<T: Copy> Expression for Scalar<T> {
    type Elem = T;
    type Stepper<'s> = ScalarStepper<T> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        0
    }

    #[inline]
    fn broadcast_shape(&self, _shape: &mut [usize]) -> Result<bool> {
        Ok(true)
    }

    #[inline]
    fn is_trivial_broadcast(&self, _strides: &[isize]) -> bool {
        true
    }

    #[inline]
    fn element(&self, _index: &[usize]) -> T {
        self.0
    }

    #[inline]
    fn linear(&self, _i: usize) -> T {
        self.0
    }

    #[inline]
    fn stepper(&self, _rank: usize) -> ScalarStepper<T> {
        ScalarStepper(self.0)
    }
}

/// Stepper of a [`Scalar`]; never moves.
#[derive(Debug, Clone, Copy)]
pub struct ScalarStepper<T>(T);

impl<T: Copy> Stepper for ScalarStepper<T> {
    type Elem = T;

    #[inline]
    fn step(&mut self, _dim: usize) {}

    #[inline]
    fn reset(&mut self, _dim: usize) {}

    #[inline]
    fn value(&self) -> T {
        self.0
    }
}

// ============================================================================
// Strided memory
// ============================================================================

/// Stepper over strided memory, shared by containers and views.
///
/// Size-1 axes carry stride and backstride 0, so broadcasting over them
/// leaves the cursor in place.
#[derive(Debug, Clone)]
pub struct StridedStepper<'s, T> {
    data: &'s [T],
    pos: isize,
    offset: usize,
    strides: &'s [isize],
    backstrides: &'s [isize],
}

impl<'s, T> StridedStepper<'s, T> {
    pub(crate) fn new(
        data: &'s [T],
        start: isize,
        rank: usize,
        strides: &'s [isize],
        backstrides: &'s [isize],
    ) -> Self {
        Self {
            data,
            pos: start,
            offset: stepper_offset(rank, strides.len()),
            strides,
            backstrides,
        }
    }
}

impl<T: Copy> Stepper for StridedStepper<'_, T> {
    type Elem = T;

    #[inline]
    fn step(&mut self, dim: usize) {
        if dim >= self.offset {
            self.pos += self.strides[dim - self.offset];
        }
    }

    #[inline]
    fn reset(&mut self, dim: usize) {
        if dim >= self.offset {
            self.pos -= self.backstrides[dim - self.offset];
        }
    }

    #[inline]
    fn value(&self) -> T {
        self.data[self.pos as usize]
    }
}

// ============================================================================
// Conversion into expressions
// ============================================================================

/// Values accepted as operands of expression operators and functions.
///
/// Expressions convert to themselves, primitive numbers and `bool` become
/// a [`Scalar`].
pub trait IntoExpression {
    type Expr: Expression;

    fn into_expr(self) -> Self::Expr;
}

impl<E: Expression> IntoExpression for E {
    type Expr = E;

    #[inline]
    fn into_expr(self) -> E {
        self
    }
}

macro_rules! impl_scalar_into_expression {
    ($($t:ty),*) => {
        $(
            impl IntoExpression for $t {
                type Expr = Scalar<$t>;

                #[inline]
                fn into_expr(self) -> Scalar<$t> {
                    Scalar(self)
                }
            }
        )*
    };
}

impl_scalar_into_expression!(
    f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool
);
impl_scalar_into_expression!(num_complex::Complex<f32>, num_complex::Complex<f64>);

// ============================================================================
// Iteration
// ============================================================================

/// Row-major iterator over any expression, driven by its stepper.
pub struct ExprIter<'s, E: Expression + 's> {
    stepper: E::Stepper<'s>,
    shape: Shape,
    index: Shape,
    remaining: usize,
}

impl<'s, E: Expression + 's> ExprIter<'s, E> {
    pub fn new(expr: &'s E) -> Result<Self> {
        let shape = expr.shape()?;
        let rank = shape.len();
        Ok(Self {
            stepper: expr.stepper(rank),
            index: Shape::from_elem(0, rank),
            remaining: compute_size(&shape),
            shape,
        })
    }

    /// Multi-index of the next element.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    fn advance(&mut self) {
        for d in (0..self.shape.len()).rev() {
            self.index[d] += 1;
            if self.index[d] < self.shape[d] {
                self.stepper.step(d);
                return;
            }
            self.index[d] = 0;
            self.stepper.reset(d);
        }
    }
}

impl<'s, E: Expression + 's> Iterator for ExprIter<'s, E> {
    type Item = E::Elem;

    fn next(&mut self) -> Option<E::Elem> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.stepper.value();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'s, E: Expression + 's> ExactSizeIterator for ExprIter<'s, E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XArray;

    #[test]
    fn test_scalar_expression() {
        let s = Scalar(2.5);
        assert_eq!(s.dimension(), 0);
        assert_eq!(s.shape().unwrap().len(), 0);
        assert_eq!(s.element(&[3, 4]), 2.5);
        assert!(s.is_trivial_broadcast(&[1, 2]));
        assert_eq!(s.iter().unwrap().collect::<Vec<_>>(), vec![2.5]);
    }

    #[test]
    fn test_into_expression() {
        let e = 3i32.into_expr();
        assert_eq!(e, Scalar(3));
        let a = XArray::from_shape_vec(&[2], vec![1, 2]).unwrap();
        let r = (&a).into_expr();
        assert_eq!(r.element(&[1]), 2);
    }

    #[test]
    fn test_expr_iter_row_major() {
        let a = XArray::from_shape_vec(&[2, 3], vec![0, 1, 2, 3, 4, 5]).unwrap();
        let mut it = Expression::iter(&a).unwrap();
        assert_eq!(it.len(), 6);
        assert_eq!(it.index(), &[0, 0]);
        it.next();
        assert_eq!(it.index(), &[0, 1]);
        assert_eq!(it.collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_expr_iter_empty() {
        let a = XArray::<f64>::from_shape(&[0, 3]).unwrap();
        assert_eq!(Expression::iter(&a).unwrap().count(), 0);
    }
}
