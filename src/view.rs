//! Borrowed strided views.
//!
//! A [`StridedView`] reinterprets a slice under its own dims, strides and
//! base offset without copying. Strides may be negative. Permuting,
//! transposing, broadcasting, slicing, flipping and squeezing only rewrite
//! the stride metadata.
//!
//! A [`StridedViewMut`] is the writable counterpart: expressions assigned
//! to it are broadcast into its fixed dims and written through to the
//! underlying memory.

use xtensor_traits::{BinaryFunctor, Divides, Minus, Multiplies, Plus};

use crate::assign::{update_strided, StridedDest};
use crate::broadcast::promote_strides_to_shape;
use crate::container::{XArray, XContainer};
use crate::expression::{Expression, IntoExpression, StridedStepper};
use crate::shape::{Dimension, Shape, Strides};
use crate::slice::{Slice, Window};
use crate::storage::Storage;
use crate::strides::{adapt_strides, check_index, check_span, compute_size, data_offset};
use crate::{broadcast, Result, XtensorError};

/// Immutable view over strided memory.
#[derive(Clone)]
pub struct StridedView<'a, T> {
    data: &'a [T],
    dims: Shape,
    strides: Strides,
    backstrides: Strides,
    offset: isize,
}

impl<T: std::fmt::Debug> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    /// View `data` under `dims` and `strides`, starting at `offset`.
    ///
    /// Fails when any reachable offset falls outside `data`.
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        check_span(data.len(), dims, strides, offset)?;
        Ok(Self::from_validated(data, dims, strides, offset))
    }

    fn from_validated(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Self {
        let mut strides = Strides::from_slice(strides);
        let mut backstrides = Strides::from_elem(0, dims.len());
        adapt_strides(dims, &mut strides, &mut backstrides);
        Self {
            data,
            dims: Shape::from_slice(dims),
            strides,
            backstrides,
            offset,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        compute_size(&self.dims)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Permute dimensions: axis `i` of the result is axis `perm[i]` here.
    pub fn permute(&self, perm: &[usize]) -> Result<StridedView<'a, T>> {
        let rank = self.dims.len();
        if perm.len() != rank {
            return Err(XtensorError::RankMismatch(rank, perm.len()));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(XtensorError::InvalidPermutation(perm.to_vec()));
            }
            seen[p] = true;
        }
        let dims: Shape = perm.iter().map(|&p| self.dims[p]).collect();
        let strides: Strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Self::from_validated(self.data, &dims, &strides, self.offset))
    }

    /// Reverse the order of all axes.
    pub fn transpose(&self) -> StridedView<'a, T> {
        let dims: Shape = self.dims.iter().rev().copied().collect();
        let strides: Strides = self.strides.iter().rev().copied().collect();
        Self::from_validated(self.data, &dims, &strides, self.offset)
    }

    /// Broadcast to `target_dims`, stretching size-1 and missing leading
    /// axes with stride 0.
    pub fn broadcast(&self, target_dims: &[usize]) -> Result<StridedView<'a, T>> {
        let strides = promote_strides_to_shape(target_dims, &self.dims, &self.strides)?;
        Ok(Self::from_validated(self.data, target_dims, &strides, self.offset))
    }

    fn window(&self) -> Window {
        Window::new(&self.dims, &self.strides, self.offset)
    }

    fn with_window(&self, window: Window) -> StridedView<'a, T> {
        Self::from_validated(self.data, &window.dims, &window.strides, window.offset)
    }

    /// Sub-view selected by `slices`, see [`Slice`].
    ///
    /// ```rust
    /// use xtensor::{s, Slice, XArray};
    ///
    /// let a = XArray::from_shape_vec(&[2, 3], (0..6).collect()).unwrap();
    /// let col = a.slice(&s![.., 1]).unwrap();
    /// assert_eq!(col.into_owned().unwrap().data(), &[1, 4]);
    /// let t = a.slice(&[Slice::Ellipsis, Slice::NewAxis]).unwrap();
    /// assert_eq!(t.dims(), &[2, 3, 1]);
    /// ```
    pub fn slice(&self, slices: &[Slice]) -> Result<StridedView<'a, T>> {
        Ok(self.with_window(self.window().slice(slices)?))
    }

    /// Drop every axis of extent 1.
    pub fn squeeze(&self) -> StridedView<'a, T> {
        self.with_window(self.window().squeeze())
    }

    /// Drop the listed axes, which must all have extent 1.
    pub fn squeeze_axes(&self, axes: &[usize]) -> Result<StridedView<'a, T>> {
        Ok(self.with_window(self.window().squeeze_axes(axes)?))
    }

    /// Insert an axis of extent 1 at position `axis`.
    pub fn expand_dims(&self, axis: usize) -> Result<StridedView<'a, T>> {
        Ok(self.with_window(self.window().expand_dims(axis)?))
    }

    /// Reverse the elements along `axis`.
    pub fn flip(&self, axis: usize) -> Result<StridedView<'a, T>> {
        Ok(self.with_window(self.window().flip(axis)?))
    }
}

impl<'a, T: Copy> StridedView<'a, T> {
    /// Checked element read.
    pub fn at(&self, index: &[usize]) -> Result<T> {
        check_index(index, &self.dims)?;
        Ok(self.data[(self.offset + data_offset(&self.strides, index)) as usize])
    }

    /// Element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<T> {
        self.at(index).ok()
    }

    /// Copy the viewed elements into a new row-major array.
    pub fn into_owned(self) -> Result<XArray<T>>
    where
        T: Default,
    {
        XArray::from_expr(self)
    }
}

impl<'a, T: Copy> Expression for StridedView<'a, T> {
    type Elem = T;
    type Stepper<'s> = StridedStepper<'s, T> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        broadcast::broadcast_shape(&self.dims, shape)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        broadcast::is_trivial_broadcast(&self.strides, strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> T {
        self.data[(self.offset + data_offset(&self.strides, index)) as usize]
    }

    #[inline]
    fn linear(&self, i: usize) -> T {
        self.data[self.offset as usize + i]
    }

    #[inline]
    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        StridedStepper::new(self.data, self.offset, rank, &self.strides, &self.backstrides)
    }
}

impl<S, D> XContainer<S, D>
where
    S: Storage,
    D: Dimension,
{
    /// Borrow the container as a strided view.
    pub fn view(&self) -> StridedView<'_, S::Elem> {
        StridedView::from_validated(self.data(), self.shape(), self.strides(), 0)
    }

    /// Borrow the part of the container selected by `slices`.
    pub fn slice(&self, slices: &[Slice]) -> Result<StridedView<'_, S::Elem>> {
        self.view().slice(slices)
    }

    /// Borrow the container as a writable strided view.
    pub fn view_mut(&mut self) -> StridedViewMut<'_, S::Elem> {
        let window = Window::new(self.shape(), self.strides(), 0);
        StridedViewMut::from_window(self.data_mut(), window)
    }

    /// Borrow the part of the container selected by `slices` for writing.
    pub fn slice_mut(&mut self, slices: &[Slice]) -> Result<StridedViewMut<'_, S::Elem>> {
        let window = Window::new(self.shape(), self.strides(), 0).slice(slices)?;
        Ok(StridedViewMut::from_window(self.data_mut(), window))
    }
}

// ============================================================================
// Mutable view
// ============================================================================

/// Mutable view over strided memory.
///
/// The dims of a mutable view are fixed: assigning an expression
/// broadcasts it into them and never resizes.
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    dims: Shape,
    strides: Strides,
    backstrides: Strides,
    offset: isize,
}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("dims", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Mutable view of `data` under `dims` and `strides`, starting at `offset`.
    pub fn new(data: &'a mut [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        check_span(data.len(), dims, strides, offset)?;
        Ok(Self::from_window(data, Window::new(dims, strides, offset)))
    }

    fn from_window(data: &'a mut [T], window: Window) -> Self {
        let Window {
            dims,
            mut strides,
            offset,
        } = window;
        let mut backstrides = Strides::from_elem(0, dims.len());
        adapt_strides(&dims, &mut strides, &mut backstrides);
        Self {
            data,
            dims,
            strides,
            backstrides,
            offset,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        compute_size(&self.dims)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.iter().any(|&d| d == 0)
    }

    /// Read-only view of the same window.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView::from_validated(&*self.data, &self.dims, &self.strides, self.offset)
    }

    /// Writable sub-view selected by `slices`.
    pub fn slice_mut(&mut self, slices: &[Slice]) -> Result<StridedViewMut<'_, T>> {
        let window = Window::new(&self.dims, &self.strides, self.offset).slice(slices)?;
        Ok(StridedViewMut::from_window(&mut *self.data, window))
    }

    /// Checked mutable element access.
    pub fn at_mut(&mut self, index: &[usize]) -> Result<&mut T> {
        check_index(index, &self.dims)?;
        let pos = self.offset + data_offset(&self.strides, index);
        Ok(&mut self.data[pos as usize])
    }

    fn dest(&mut self) -> StridedDest<'_, T> {
        StridedDest {
            data: &mut *self.data,
            offset: self.offset,
            shape: &self.dims,
            strides: &self.strides,
            backstrides: &self.backstrides,
        }
    }
}

impl<'a, T: Copy> StridedViewMut<'a, T> {
    /// Checked element read.
    pub fn at(&self, index: &[usize]) -> Result<T> {
        check_index(index, &self.dims)?;
        Ok(self.data[(self.offset + data_offset(&self.strides, index)) as usize])
    }

    /// Write `value` to every viewed element.
    pub fn fill(&mut self, value: T) -> Result<()> {
        self.assign(crate::Scalar(value))
    }

    /// Evaluate `expr` into the viewed elements.
    ///
    /// `expr` must broadcast to the view's dims; nothing is written otherwise.
    pub fn assign<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        E::Expr: Expression<Elem = T>,
    {
        let expr = expr.into_expr();
        update_strided(self.dest(), &expr, |slot, value| *slot = value)
    }

    fn compound<F, E>(&mut self, functor: F, expr: &E) -> Result<()>
    where
        E: Expression,
        F: BinaryFunctor<T, E::Elem, Output = T>,
    {
        update_strided(self.dest(), expr, |slot, value| {
            *slot = functor.apply(*slot, value)
        })
    }

    /// `view += expr`, broadcasting `expr` into the view.
    pub fn add_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Plus: BinaryFunctor<T, <E::Expr as Expression>::Elem, Output = T>,
    {
        self.compound(Plus, &expr.into_expr())
    }

    /// `view -= expr`, broadcasting `expr` into the view.
    pub fn sub_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Minus: BinaryFunctor<T, <E::Expr as Expression>::Elem, Output = T>,
    {
        self.compound(Minus, &expr.into_expr())
    }

    /// `view *= expr`, broadcasting `expr` into the view.
    pub fn mul_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Multiplies: BinaryFunctor<T, <E::Expr as Expression>::Elem, Output = T>,
    {
        self.compound(Multiplies, &expr.into_expr())
    }

    /// `view /= expr`, broadcasting `expr` into the view.
    pub fn div_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Divides: BinaryFunctor<T, <E::Expr as Expression>::Elem, Output = T>,
    {
        self.compound(Divides, &expr.into_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_new_validates_bounds() {
        let data = [0.0f64; 6];
        assert!(StridedView::new(&data, &[2, 3], &[3, 1], 0).is_ok());
        assert!(StridedView::new(&data, &[2, 3], &[3, 1], 1).is_err());
        assert!(StridedView::new(&data, &[2, 3], &[3], 0).is_err());
    }

    #[test]
    fn test_view_get() {
        let data: Vec<i32> = (0..6).collect();
        let v = StridedView::new(&data, &[2, 3], &[3, 1], 0).unwrap();
        assert_eq!(v.get(&[1, 2]), Some(5));
        assert_eq!(v.get(&[2, 0]), None);
        assert!(v.at(&[0]).is_err());
    }

    #[test]
    fn test_negative_strides() {
        let data: Vec<i32> = (0..4).collect();
        let v = StridedView::new(&data, &[4], &[-1], 3).unwrap();
        let owned = v.into_owned().unwrap();
        assert_eq!(owned.data(), &[3, 2, 1, 0]);
    }

    #[test]
    fn test_permute_and_transpose() {
        let data: Vec<i32> = (0..24).collect();
        let v = StridedView::new(&data, &[2, 3, 4], &[12, 4, 1], 0).unwrap();
        let p = v.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.dims(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        assert_eq!(p.get(&[3, 1, 2]), v.get(&[1, 2, 3]));
        let t = v.transpose();
        assert_eq!(t.dims(), &[4, 3, 2]);
        assert_eq!(t.get(&[3, 2, 1]), Some(23));
    }

    #[test]
    fn test_permute_rejects_invalid() {
        let data = [0u8; 6];
        let v = StridedView::new(&data, &[2, 3], &[3, 1], 0).unwrap();
        assert!(matches!(
            v.permute(&[0]),
            Err(XtensorError::RankMismatch(2, 1))
        ));
        assert!(matches!(
            v.permute(&[0, 0]),
            Err(XtensorError::InvalidPermutation(_))
        ));
        assert!(v.permute(&[0, 2]).is_err());
    }

    #[test]
    fn test_broadcast_view() {
        let data = [1, 2, 3];
        let v = StridedView::new(&data, &[3], &[1], 0).unwrap();
        let b = v.broadcast(&[2, 3]).unwrap();
        assert_eq!(b.strides(), &[0, 1]);
        assert_eq!(b.into_owned().unwrap().data(), &[1, 2, 3, 1, 2, 3]);
        assert!(v.broadcast(&[2, 4]).is_err());
    }

    #[test]
    fn test_transposed_view_in_expression() {
        let a = XArray::from_shape_vec(&[2, 3], (0..6).collect()).unwrap();
        let t = a.view().transpose();
        let b = XArray::from_shape_vec(&[3, 2], vec![0, 3, 1, 4, 2, 5]).unwrap();
        let sum = XArray::from_expr(&t + &b).unwrap();
        assert_eq!(sum.data(), &[0, 6, 2, 8, 4, 10]);
    }

    #[test]
    fn test_slice_selects_rows_and_columns() {
        let a = XArray::from_shape_vec(&[3, 4], (0..12).collect()).unwrap();
        let v = a.slice(&[Slice::range(1, 3), Slice::stepped(0, 4, 2)]).unwrap();
        assert_eq!(v.dims(), &[2, 2]);
        assert_eq!(v.into_owned().unwrap().data(), &[4, 6, 8, 10]);

        let row = a.slice(&[Slice::Index(-1)]).unwrap();
        assert_eq!(row.dims(), &[4]);
        assert_eq!(row.into_owned().unwrap().data(), &[8, 9, 10, 11]);

        let rev = a.slice(&[Slice::all(), Slice::every(-1)]).unwrap();
        assert_eq!(rev.get(&[0, 0]), Some(3));
        assert_eq!(rev.get(&[2, 3]), Some(8));
    }

    #[test]
    fn test_slice_of_slice_composes() {
        let a = XArray::from_shape_vec(&[10], (0..10).collect()).unwrap();
        let odd = a.slice(&[Slice::stepped(1, 10, 2)]).unwrap();
        let tail = odd.slice(&[Slice::every(-2)]).unwrap();
        assert_eq!(tail.into_owned().unwrap().data(), &[9, 5, 1]);
    }

    #[test]
    fn test_sliced_view_in_expression() {
        let a = XArray::from_shape_vec(&[2, 3], (0..6).collect()).unwrap();
        let first = a.slice(&[Slice::all(), Slice::Index(0)]).unwrap();
        let col = first.expand_dims(1).unwrap();
        let centered = XArray::from_expr(&a - &col).unwrap();
        assert_eq!(centered.data(), &[0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_squeeze_and_flip() {
        let a = XArray::from_shape_vec(&[1, 3, 1], vec![1, 2, 3]).unwrap();
        let v = a.view();
        assert_eq!(v.squeeze().dims(), &[3]);
        assert_eq!(v.squeeze_axes(&[0]).unwrap().dims(), &[3, 1]);
        assert!(matches!(
            v.squeeze_axes(&[1]),
            Err(XtensorError::NotSqueezable { axis: 1, extent: 3 })
        ));
        let f = v.flip(1).unwrap();
        assert_eq!(f.into_owned().unwrap().data(), &[3, 2, 1]);
        assert!(v.flip(3).is_err());
    }

    #[test]
    fn test_view_mut_assign_broadcasts_into_window() {
        let mut a = XArray::<i32>::from_shape_value(&[3, 4], 0).unwrap();
        let row = XArray::from_shape_vec(&[2], vec![1, 2]).unwrap();
        {
            let mut inner = a.slice_mut(&[Slice::range(1, 3), Slice::range(1, 3)]).unwrap();
            assert_eq!(inner.dims(), &[2, 2]);
            inner.assign(&row).unwrap();
        }
        assert_eq!(a.data(), &[0, 0, 0, 0, 0, 1, 2, 0, 0, 1, 2, 0]);

        let mut col = a.slice_mut(&[Slice::all(), Slice::Index(0)]).unwrap();
        col.fill(7).unwrap();
        *col.at_mut(&[1]).unwrap() = 9;
        assert_eq!(col.at(&[1]).unwrap(), 9);
        assert_eq!(a.data(), &[7, 0, 0, 0, 9, 1, 2, 0, 7, 1, 2, 0]);
    }

    #[test]
    fn test_view_mut_reversed_and_compound() {
        let mut a = XArray::from_shape_vec(&[4], vec![1, 2, 3, 4]).unwrap();
        let src = XArray::from_shape_vec(&[4], vec![10, 20, 30, 40]).unwrap();
        let mut rev = a.slice_mut(&[Slice::every(-1)]).unwrap();
        rev.add_assign_expr(&src).unwrap();
        assert_eq!(a.data(), &[41, 32, 23, 14]);

        let mut even = a.slice_mut(&[Slice::stepped(0, 4, 2)]).unwrap();
        even.mul_assign_expr(2).unwrap();
        even.sub_assign_expr(1).unwrap();
        assert_eq!(a.data(), &[81, 32, 45, 14]);
    }

    #[test]
    fn test_view_mut_rejects_mismatched_shape() {
        let mut a = XArray::from_shape_vec(&[2, 3], (0..6).collect()).unwrap();
        let wide = XArray::from_shape_vec(&[3], vec![1, 1, 1]).unwrap();
        let mut first_two = a.slice_mut(&[Slice::all(), Slice::range(0, 2)]).unwrap();
        assert!(matches!(
            first_two.assign(&wide),
            Err(XtensorError::BroadcastMismatch { .. })
        ));
        assert_eq!(a.data(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_view_mut_nested_slices() {
        let mut data = vec![0.0f64; 8];
        let mut v = StridedViewMut::new(&mut data, &[2, 4], &[4, 1], 0).unwrap();
        {
            let mut right = v.slice_mut(&[Slice::all(), Slice::range(2, 4)]).unwrap();
            let mut corner = right.slice_mut(&[Slice::Index(1)]).unwrap();
            corner.fill(1.5).unwrap();
        }
        assert_eq!(v.as_view().get(&[1, 3]), Some(1.5));
        assert_eq!(data, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.5, 1.5]);
        assert!(StridedViewMut::new(&mut data, &[3, 3], &[3, 1], 0).is_err());
    }
}
