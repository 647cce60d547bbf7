//! Lazy reductions over a subset of axes.
//!
//! [`reduce`] folds a binary functor over the chosen axes of an expression
//! and yields an [`XReducer`], itself an expression whose shape is the
//! source shape with those axes removed (or kept with extent 1). Each
//! element is computed on access:
//!
//! 1. the result index is spread into a full-rank source index with zeros
//!    at the reduced positions
//! 2. [`ReducingIter`] walks the reduced axes like a multi-radix counter,
//!    the last reduced axis varying fastest
//! 3. the values are folded from the initial value, or from the first
//!    element when none was given
//!
//! Every [`ReducingIter`] owns its index, so several may run over the same
//! reducer at once.

use tracing::debug;
use xtensor_traits::BinaryFunctor;

use crate::broadcast;
use crate::container::XArray;
use crate::expression::{stepper_offset, ExprIter, Expression, IntoExpression, Stepper};
use crate::layout::Layout;
use crate::shape::{Shape, Strides};
use crate::strides::{compute_size, compute_strides, data_offset, unravel_index};
use crate::{Result, XtensorError};

// ============================================================================
// Options
// ============================================================================

/// When a reducer computes its elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EvaluationStrategy {
    /// Fold on every element access.
    #[default]
    Lazy,
    /// Fold every element once at construction and serve reads from the
    /// cached values.
    Immediate,
}

/// Options shared by all reductions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReducerOptions<T> {
    pub strategy: EvaluationStrategy,
    /// Keep reduced axes in the result shape with extent 1.
    pub keep_dims: bool,
    /// Value the fold starts from. Without it the fold starts from the
    /// first reduced element and an empty reduction is an error.
    pub initial: Option<T>,
}

impl<T> Default for ReducerOptions<T> {
    fn default() -> Self {
        Self {
            strategy: EvaluationStrategy::Lazy,
            keep_dims: false,
            initial: None,
        }
    }
}

impl<T> ReducerOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: EvaluationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn immediate(self) -> Self {
        self.strategy(EvaluationStrategy::Immediate)
    }

    pub fn keep_dims(mut self, keep: bool) -> Self {
        self.keep_dims = keep;
        self
    }

    pub fn initial(mut self, value: T) -> Self {
        self.initial = Some(value);
        self
    }
}

/// Axes to reduce over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Axes {
    /// Every axis; the result is 0-d.
    #[default]
    All,
    /// The listed axes, in any order.
    List(Shape),
}

impl<const N: usize> From<[usize; N]> for Axes {
    fn from(axes: [usize; N]) -> Self {
        Axes::List(Shape::from_slice(&axes))
    }
}

impl From<&[usize]> for Axes {
    fn from(axes: &[usize]) -> Self {
        Axes::List(Shape::from_slice(axes))
    }
}

impl From<Vec<usize>> for Axes {
    fn from(axes: Vec<usize>) -> Self {
        Axes::List(Shape::from(axes))
    }
}

impl From<usize> for Axes {
    fn from(axis: usize) -> Self {
        Axes::List(Shape::from_slice(&[axis]))
    }
}

impl Axes {
    /// Sorted, validated axis list for an expression of rank `rank`.
    pub(crate) fn resolve(&self, rank: usize) -> Result<Shape> {
        let mut axes = match self {
            Axes::All => (0..rank).collect(),
            Axes::List(list) => list.clone(),
        };
        if let Some(&axis) = axes.iter().find(|&&a| a >= rank) {
            return Err(XtensorError::InvalidAxis { axis, rank });
        }
        axes.sort_unstable();
        if let Some(pair) = axes.windows(2).find(|w| w[0] == w[1]) {
            return Err(XtensorError::DuplicateAxis(pair[0]));
        }
        Ok(axes)
    }
}

/// Number of source elements folded into each reduced element.
pub(crate) fn reduced_count(shape: &[usize], axes: &[usize]) -> usize {
    axes.iter().map(|&a| shape[a]).product()
}

// ============================================================================
// Reducer
// ============================================================================

/// Lazy reduction of `E` by the functor `F`.
pub struct XReducer<F, E: Expression> {
    functor: F,
    expr: E,
    source_shape: Shape,
    axes: Shape,
    /// Source axis read by each result axis, `None` for kept reduced axes.
    source_axis: Vec<Option<usize>>,
    shape: Shape,
    keep_dims: bool,
    initial: Option<E::Elem>,
    cache: Option<Cache<E::Elem>>,
}

/// Row-major values of an immediate reducer.
struct Cache<T> {
    values: Vec<T>,
    strides: Strides,
}

/// Reduce `expr` over `axes` with `functor`.
///
/// Fails with [`XtensorError::InvalidAxis`] or
/// [`XtensorError::DuplicateAxis`] for a bad axis set, and with
/// [`XtensorError::EmptyReduction`] when a reduced axis has extent 0 and
/// no initial value was given.
pub fn reduce<F, E, A>(
    functor: F,
    expr: E,
    axes: A,
    options: ReducerOptions<<E::Expr as Expression>::Elem>,
) -> Result<XReducer<F, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    F: BinaryFunctor<
        <E::Expr as Expression>::Elem,
        <E::Expr as Expression>::Elem,
        Output = <E::Expr as Expression>::Elem,
    >,
{
    let expr = expr.into_expr();
    let source_shape = expr.shape()?;
    let axes = axes.into().resolve(source_shape.len())?;
    if options.initial.is_none() && reduced_count(&source_shape, &axes) == 0 {
        return Err(XtensorError::EmptyReduction);
    }

    let mut shape = Shape::new();
    let mut source_axis = Vec::with_capacity(source_shape.len());
    for (d, &n) in source_shape.iter().enumerate() {
        if axes.contains(&d) {
            if options.keep_dims {
                shape.push(1);
                source_axis.push(None);
            }
        } else {
            shape.push(n);
            source_axis.push(Some(d));
        }
    }

    let mut reducer = XReducer {
        functor,
        expr,
        source_shape,
        axes,
        source_axis,
        shape,
        keep_dims: options.keep_dims,
        initial: options.initial,
        cache: None,
    };
    if options.strategy == EvaluationStrategy::Immediate {
        reducer.materialize()?;
    }
    Ok(reducer)
}

impl<F, E: Expression> XReducer<F, E> {
    /// Source axes being reduced, ascending.
    pub fn axes(&self) -> &[usize] {
        &self.axes
    }

    /// Shape of the expression being reduced.
    pub fn source_shape(&self) -> &[usize] {
        &self.source_shape
    }

    pub fn keeps_dims(&self) -> bool {
        self.keep_dims
    }

    pub fn functor(&self) -> &F {
        &self.functor
    }

    pub fn expr(&self) -> &E {
        &self.expr
    }

    pub fn strategy(&self) -> EvaluationStrategy {
        if self.cache.is_some() {
            EvaluationStrategy::Immediate
        } else {
            EvaluationStrategy::Lazy
        }
    }

    /// Source index for a right-aligned result index.
    fn source_index(&self, index: &[usize]) -> Shape {
        let rank = self.shape.len();
        let index = &index[index.len() - rank..];
        let mut full = Shape::from_elem(0, self.source_shape.len());
        for ((&i, &n), axis) in index.iter().zip(self.shape.iter()).zip(&self.source_axis) {
            if let Some(d) = *axis {
                full[d] = if n == 1 { 0 } else { i };
            }
        }
        full
    }

    /// Iterator over the source elements folded into the result element at
    /// `index`.
    pub fn reducing_iter(&self, index: &[usize]) -> ReducingIter<'_, E> {
        ReducingIter::new(&self.expr, &self.source_shape, &self.axes, self.source_index(index))
    }
}

impl<F, E> XReducer<F, E>
where
    E: Expression,
    F: BinaryFunctor<E::Elem, E::Elem, Output = E::Elem>,
{
    fn fold(&self, index: &[usize]) -> E::Elem {
        let mut iter = self.reducing_iter(index);
        let start = match self.initial {
            Some(v) => v,
            None => match iter.next() {
                Some(v) => v,
                None => unreachable!("empty reduction without an initial value"),
            },
        };
        iter.fold(start, |acc, v| self.functor.apply(acc, v))
    }

    fn materialize(&mut self) -> Result<()> {
        debug!(shape = ?self.shape, axes = ?self.axes, "evaluating reducer immediately");
        let values: Vec<E::Elem> = ExprIter::new(&*self)?.collect();
        let mut strides = Strides::from_elem(0, self.shape.len());
        compute_strides(&self.shape, Layout::RowMajor, &mut strides);
        self.cache = Some(Cache { values, strides });
        Ok(())
    }

    /// The single value of a reducer with one element.
    pub fn value(&self) -> Result<E::Elem> {
        let size = compute_size(&self.shape);
        if size != 1 {
            return Err(XtensorError::SizeMismatch {
                expected: 1,
                found: size,
            });
        }
        Ok(self.element(&Shape::from_elem(0, self.shape.len())))
    }

    /// Evaluate every element into a new row-major array.
    pub fn eval(&self) -> Result<XArray<E::Elem>>
    where
        E::Elem: Default,
    {
        match &self.cache {
            Some(cache) => XArray::from_shape_vec(&self.shape, cache.values.clone()),
            None => XArray::from_expr(self),
        }
    }
}

impl<F, E> Expression for XReducer<F, E>
where
    E: Expression,
    F: BinaryFunctor<E::Elem, E::Elem, Output = E::Elem>,
{
    type Elem = E::Elem;
    type Stepper<'s> = ReducerStepper<'s, F, E> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        broadcast::broadcast_shape(&self.shape, shape)
    }

    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        match &self.cache {
            Some(cache) => broadcast::is_trivial_broadcast(&cache.strides, strides),
            None => false,
        }
    }

    fn element(&self, index: &[usize]) -> E::Elem {
        match &self.cache {
            Some(cache) => cache.values[data_offset(&cache.strides, index) as usize],
            None => self.fold(index),
        }
    }

    fn linear(&self, i: usize) -> E::Elem {
        match &self.cache {
            Some(cache) => cache.values[i],
            None => self.fold(&unravel_index(i, &self.shape, Layout::RowMajor)),
        }
    }

    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        ReducerStepper {
            reducer: self,
            offset: stepper_offset(rank, self.shape.len()),
            index: Shape::from_elem(0, self.shape.len()),
        }
    }
}

impl<F, E> std::fmt::Debug for XReducer<F, E>
where
    E: Expression,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XReducer")
            .field("source_shape", &self.source_shape)
            .field("axes", &self.axes)
            .field("shape", &self.shape)
            .field("strategy", &self.strategy())
            .finish()
    }
}

/// Stepper of an [`XReducer`]: tracks a result index and folds on read.
pub struct ReducerStepper<'s, F, E: Expression> {
    reducer: &'s XReducer<F, E>,
    offset: usize,
    index: Shape,
}

impl<F, E> Stepper for ReducerStepper<'_, F, E>
where
    E: Expression,
    F: BinaryFunctor<E::Elem, E::Elem, Output = E::Elem>,
{
    type Elem = E::Elem;

    #[inline]
    fn step(&mut self, dim: usize) {
        if dim >= self.offset {
            self.index[dim - self.offset] += 1;
        }
    }

    #[inline]
    fn reset(&mut self, dim: usize) {
        if dim >= self.offset {
            self.index[dim - self.offset] = 0;
        }
    }

    #[inline]
    fn value(&self) -> E::Elem {
        self.reducer.element(&self.index)
    }
}

// ============================================================================
// Reducing iterator
// ============================================================================

/// Walks the reduced axes of a source expression for one result element.
///
/// The innermost reduced axis advances first; when it wraps to 0 the carry
/// moves to the next reduced axis outwards, and a carry out of the
/// outermost one ends the iteration.
pub struct ReducingIter<'r, E> {
    expr: &'r E,
    shape: &'r [usize],
    axes: &'r [usize],
    index: Shape,
    done: bool,
}

impl<'r, E: Expression> ReducingIter<'r, E> {
    fn new(expr: &'r E, shape: &'r [usize], axes: &'r [usize], index: Shape) -> Self {
        let done = axes.iter().any(|&a| shape[a] == 0);
        Self {
            expr,
            shape,
            axes,
            index,
            done,
        }
    }

    /// Source index of the next element.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    fn advance(&mut self) {
        for &a in self.axes.iter().rev() {
            self.index[a] += 1;
            if self.index[a] < self.shape[a] {
                return;
            }
            self.index[a] = 0;
        }
        self.done = true;
    }
}

impl<E: Expression> Iterator for ReducingIter<'_, E> {
    type Item = E::Elem;

    fn next(&mut self) -> Option<E::Elem> {
        if self.done {
            return None;
        }
        let value = self.expr.element(&self.index);
        self.advance();
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtensor_traits::{Maximum, Plus};

    fn arange(shape: &[usize]) -> XArray<i64> {
        let n = compute_size(shape);
        XArray::from_shape_vec(shape, (0..n as i64).collect()).unwrap()
    }

    #[test]
    fn test_reduce_shape_excludes_axes() {
        let a = arange(&[2, 3, 4]);
        let r = reduce(Plus, &a, [1], ReducerOptions::default()).unwrap();
        assert_eq!(r.shape().unwrap(), [2, 4]);
        assert_eq!(r.axes(), &[1]);
        // a[1, :, 2] = 14, 18, 22
        assert_eq!(r.element(&[1, 2]), 54);
    }

    #[test]
    fn test_reduce_unsorted_axes_and_keep_dims() {
        let a = arange(&[2, 3, 4]);
        let opts = ReducerOptions::default().keep_dims(true);
        let r = reduce(Plus, &a, [2, 0], opts).unwrap();
        assert_eq!(r.axes(), &[0, 2]);
        assert_eq!(r.shape().unwrap(), [1, 3, 1]);
        // sum of a[:, 0, :] = (0+1+2+3) + (12+13+14+15)
        assert_eq!(r.element(&[0, 0, 0]), 60);
    }

    #[test]
    fn test_reducing_iter_visits_each_once() {
        let a = arange(&[2, 3, 4]);
        let r = reduce(Plus, &a, [0, 2], ReducerOptions::default()).unwrap();
        let mut it = r.reducing_iter(&[1]);
        assert_eq!(it.index(), &[0, 1, 0]);
        it.next();
        assert_eq!(it.index(), &[0, 1, 1]);
        let values: Vec<i64> = r.reducing_iter(&[1]).collect();
        assert_eq!(values, vec![4, 5, 6, 7, 16, 17, 18, 19]);
        assert_eq!(r.element(&[1]), values.iter().sum::<i64>());
    }

    #[test]
    fn test_independent_iterators() {
        let a = arange(&[2, 2]);
        let r = reduce(Plus, &a, [0], ReducerOptions::default()).unwrap();
        let mut first = r.reducing_iter(&[0]);
        let mut second = r.reducing_iter(&[1]);
        assert_eq!(first.next(), Some(0));
        assert_eq!(second.next(), Some(1));
        assert_eq!(first.next(), Some(2));
        assert_eq!(second.next(), Some(3));
        assert_eq!(first.next(), None);
    }

    #[test]
    fn test_reduce_all_axes_value() {
        let a = arange(&[2, 3]);
        let r = reduce(Plus, &a, Axes::All, ReducerOptions::default()).unwrap();
        assert_eq!(r.dimension(), 0);
        assert_eq!(r.value().unwrap(), 15);
        let partial = reduce(Plus, &a, 0usize, ReducerOptions::default()).unwrap();
        assert!(partial.value().is_err());
    }

    #[test]
    fn test_reduce_invalid_axes() {
        let a = arange(&[2, 3]);
        assert!(matches!(
            reduce(Plus, &a, [2], ReducerOptions::default()),
            Err(XtensorError::InvalidAxis { axis: 2, rank: 2 })
        ));
        assert!(matches!(
            reduce(Plus, &a, vec![1, 1], ReducerOptions::default()),
            Err(XtensorError::DuplicateAxis(1))
        ));
    }

    #[test]
    fn test_empty_reduction_needs_initial() {
        let a = XArray::<i64>::from_shape(&[0, 3]).unwrap();
        assert!(matches!(
            reduce(Maximum, &a, [0], ReducerOptions::default()),
            Err(XtensorError::EmptyReduction)
        ));
        let r = reduce(Maximum, &a, [0], ReducerOptions::default().initial(-1)).unwrap();
        assert_eq!(r.eval().unwrap().data(), &[-1, -1, -1]);
    }

    #[test]
    fn test_initial_value_is_folded_in() {
        let a = arange(&[3]);
        let r = reduce(Plus, &a, Axes::All, ReducerOptions::default().initial(100)).unwrap();
        assert_eq!(r.value().unwrap(), 103);
    }

    #[test]
    fn test_immediate_matches_lazy() {
        let a = arange(&[3, 4]);
        let lazy = reduce(Plus, &a, [1], ReducerOptions::default()).unwrap();
        let eager = reduce(Plus, &a, [1], ReducerOptions::default().immediate()).unwrap();
        assert_eq!(lazy.strategy(), EvaluationStrategy::Lazy);
        assert_eq!(eager.strategy(), EvaluationStrategy::Immediate);
        assert_eq!(lazy.eval().unwrap(), eager.eval().unwrap());
        assert_eq!(eager.eval().unwrap().data(), &[6, 22, 38]);
    }

    #[test]
    fn test_reducer_in_expression() {
        let a = arange(&[2, 3]);
        let col = reduce(Plus, &a, [1], ReducerOptions::default().keep_dims(true)).unwrap();
        let centered = XArray::from_expr(&a * 3i64 - &col).unwrap();
        assert_eq!(centered.data(), &[-3, 0, 3, -3, 0, 3]);
        let row = reduce(Plus, &a, [0], ReducerOptions::default().immediate()).unwrap();
        let shifted = XArray::from_expr(&a + &row).unwrap();
        assert_eq!(shifted.data(), &[3, 6, 9, 6, 9, 12]);
    }

    #[test]
    fn test_reducer_iter() {
        let a = arange(&[2, 3]);
        let r = reduce(Maximum, &a, [0], ReducerOptions::default()).unwrap();
        assert_eq!(Expression::iter(&r).unwrap().collect::<Vec<_>>(), vec![3, 4, 5]);
        let mut one = Expression::iter(&r).unwrap();
        let mut two = Expression::iter(&r).unwrap();
        one.next();
        assert_eq!(two.next(), Some(3));
        assert_eq!(one.next(), Some(4));
    }
}
