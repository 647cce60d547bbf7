//! Owning multidimensional containers.
//!
//! [`XContainer`] couples a [`Storage`] backend with a shape kept the way
//! its [`Dimension`] says: dynamic ([`XArray`]), static rank
//! ([`XTensor`]) or compile-time fixed ([`XTensorFixed`]). Strides and
//! backstrides are derived from the shape and layout and stored alongside.
//!
//! Adaptors are containers over borrowed or externally owned storage; see
//! [`crate::adapt`].

use std::fmt;
use std::ops::{Index, IndexMut};

use num_complex::Complex;
use tracing::debug;
use xtensor_traits::{BinaryFunctor, Divides, Minus, Multiplies, Plus};

use crate::assign::{assign_data, compound_assign};
use crate::broadcast;
use crate::expression::{Expression, IntoExpression, StridedStepper};
use crate::layout::{detect_layout, Layout};
use crate::shape::{Dimension, Dyn, Fixed, FixedShape, Rank, Shape};
use crate::storage::{OwnedStorage, Storage, UVector};
use crate::strides::{adapt_strides, check_index, compute_size, data_offset, required_len};
use crate::{Result, XtensorError, DEFAULT_LAYOUT};

// ============================================================================
// Container
// ============================================================================

/// A storage backend plus shape, strides and backstrides.
#[derive(Clone)]
pub struct XContainer<S: Storage, D: Dimension = Dyn> {
    storage: S,
    shape: D::Shape,
    strides: D::Strides,
    backstrides: D::Strides,
    layout: Layout,
}

/// Dynamic-rank array on exclusively owned heap storage.
pub type XArray<T> = XContainer<UVector<T>, Dyn>;

/// Array whose rank `N` is fixed at compile time.
pub type XTensor<T, const N: usize> = XContainer<UVector<T>, Rank<N>>;

/// Array whose whole shape is fixed at compile time.
///
/// For inline storage use `XContainer<AlignedArray<T, SIZE>, Fixed<F>>`
/// with `SIZE == F::SIZE`.
pub type XTensorFixed<T, F> = XContainer<UVector<T>, Fixed<F>>;

/// Dynamic-rank container over caller-provided storage.
pub type XArrayAdaptor<S> = XContainer<S, Dyn>;

/// Static-rank container over caller-provided storage.
pub type XTensorAdaptor<S, const N: usize> = XContainer<S, Rank<N>>;

impl<S: Storage, D: Dimension> XContainer<S, D> {
    /// Wrap `storage` with dense strides for `shape` in `layout`.
    ///
    /// The caller guarantees `storage.len() == compute_size(shape)`.
    pub(crate) fn from_parts(storage: S, shape: D::Shape, layout: Layout) -> Self {
        let layout = layout.storage_order();
        let (strides, backstrides) = D::layout_strides(&shape, layout);
        Self {
            storage,
            shape,
            strides,
            backstrides,
            layout,
        }
    }

    /// Wrap `storage` with caller-supplied non-negative strides.
    pub(crate) fn from_parts_strided(storage: S, shape: D::Shape, strides: &[isize]) -> Result<Self> {
        let dims = shape.as_ref();
        if strides.len() != dims.len() {
            return Err(XtensorError::StrideLengthMismatch);
        }
        let needed = required_len(dims, strides)?;
        if storage.len() < needed {
            return Err(XtensorError::SizeMismatch {
                expected: needed,
                found: storage.len(),
            });
        }
        let mut own = D::zero_strides(dims.len());
        let mut backstrides = D::zero_strides(dims.len());
        own.as_mut().copy_from_slice(strides);
        adapt_strides(dims, own.as_mut(), backstrides.as_mut());
        let layout = detect_layout(dims, own.as_ref());
        Ok(Self {
            storage,
            shape,
            strides: own,
            backstrides,
            layout,
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.as_ref()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.strides.as_ref()
    }

    #[inline]
    pub fn backstrides(&self) -> &[isize] {
        self.backstrides.as_ref()
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.shape().len()
    }

    /// Number of elements addressed by the shape.
    #[inline]
    pub fn size(&self) -> usize {
        compute_size(self.shape())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether the elements fill the storage densely in a row- or
    /// column-major order.
    pub fn is_contiguous(&self) -> bool {
        self.layout != Layout::Dynamic && self.storage.len() == self.size()
    }

    /// Underlying storage in memory order.
    #[inline]
    pub fn data(&self) -> &[S::Elem] {
        self.storage.as_slice()
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [S::Elem] {
        self.storage.as_mut_slice()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub(crate) fn raw_parts_mut(&mut self) -> (&mut [S::Elem], &[usize], &[isize], &[isize]) {
        (
            self.storage.as_mut_slice(),
            self.shape.as_ref(),
            self.strides.as_ref(),
            self.backstrides.as_ref(),
        )
    }

    /// Checked element access.
    pub fn at(&self, index: &[usize]) -> Result<&S::Elem> {
        check_index(index, self.shape())?;
        let offset = data_offset(self.strides(), index) as usize;
        Ok(&self.storage.as_slice()[offset])
    }

    /// Checked mutable element access.
    pub fn at_mut(&mut self, index: &[usize]) -> Result<&mut S::Elem> {
        check_index(index, self.shape())?;
        let offset = data_offset(self.strides(), index) as usize;
        Ok(&mut self.storage.as_mut_slice()[offset])
    }

    /// Element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<&S::Elem> {
        self.at(index).ok()
    }

    /// Element at position `i` of the storage, ignoring the shape.
    #[inline]
    pub fn flat(&self, i: usize) -> &S::Elem {
        &self.storage.as_slice()[i]
    }

    #[inline]
    pub fn flat_mut(&mut self, i: usize) -> &mut S::Elem {
        &mut self.storage.as_mut_slice()[i]
    }

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: S::Elem)
    where
        S::Elem: Clone,
    {
        self.storage.as_mut_slice().fill(value);
    }

    /// Elements in row-major order of the shape, whatever the layout.
    pub fn iter(&self) -> Iter<'_, S::Elem> {
        Iter::new(
            self.storage.as_slice(),
            self.shape(),
            self.strides(),
            self.backstrides(),
        )
    }

    /// Elements in memory order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, S::Elem> {
        self.storage.as_mut_slice().iter_mut()
    }

    /// Change the shape, reallocating storage when the size changes.
    ///
    /// Contents are unspecified afterwards unless the shape is unchanged.
    /// Fixed containers accept only their own shape, which is a no-op.
    /// Storage that cannot change length fails with
    /// [`XtensorError::NotResizable`] and leaves the container untouched.
    pub fn resize(&mut self, shape: &[usize]) -> Result<()> {
        let new_shape = D::shape_from_slice(shape)?;
        if self.shape() == shape {
            return Ok(());
        }
        let layout = self.layout.storage_order();
        let size = compute_size(shape);
        if size != self.storage.len() {
            debug!(from = ?self.shape(), to = ?shape, size, "reallocating container storage");
        }
        self.storage.resize(size)?;
        let (strides, backstrides) = D::layout_strides(&new_shape, layout);
        self.shape = new_shape;
        self.strides = strides;
        self.backstrides = backstrides;
        self.layout = layout;
        Ok(())
    }

    /// Reinterpret the elements under a shape of the same size.
    ///
    /// Elements keep their order in the container's layout. Containers with
    /// caller-supplied strides are first compacted into the default layout.
    pub fn reshape(&mut self, shape: &[usize]) -> Result<()>
    where
        S::Elem: Clone,
    {
        let new_shape = D::shape_from_slice(shape)?;
        let size = compute_size(shape);
        if size != self.size() {
            return Err(XtensorError::SizeMismatch {
                expected: self.size(),
                found: size,
            });
        }
        if !self.is_contiguous() {
            let compact: Vec<S::Elem> = self.iter().cloned().collect();
            self.storage.resize(size)?;
            self.storage.as_mut_slice().clone_from_slice(&compact);
            self.layout = DEFAULT_LAYOUT;
        }
        let (strides, backstrides) = D::layout_strides(&new_shape, self.layout);
        self.shape = new_shape;
        self.strides = strides;
        self.backstrides = backstrides;
        Ok(())
    }
}

// ============================================================================
// Construction
// ============================================================================

impl<S, D> XContainer<S, D>
where
    S: OwnedStorage,
    S::Elem: Clone + Default,
    D: Dimension,
{
    /// Default-initialised container in [`DEFAULT_LAYOUT`].
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        Self::from_shape_value_layout(shape, S::Elem::default(), DEFAULT_LAYOUT)
    }

    pub fn from_shape_layout(shape: &[usize], layout: Layout) -> Result<Self> {
        Self::from_shape_value_layout(shape, S::Elem::default(), layout)
    }

    /// Container with every element set to `value`.
    pub fn from_shape_value(shape: &[usize], value: S::Elem) -> Result<Self> {
        Self::from_shape_value_layout(shape, value, DEFAULT_LAYOUT)
    }

    pub fn from_shape_value_layout(shape: &[usize], value: S::Elem, layout: Layout) -> Result<Self> {
        let shape = D::shape_from_slice(shape)?;
        let storage = S::from_elem(compute_size(shape.as_ref()), value)?;
        Ok(Self::from_parts(storage, shape, layout))
    }

    /// Container over `data` laid out in row-major order.
    pub fn from_shape_vec(shape: &[usize], data: Vec<S::Elem>) -> Result<Self> {
        Self::from_shape_vec_layout(shape, data, DEFAULT_LAYOUT)
    }

    pub fn from_shape_vec_layout(
        shape: &[usize],
        data: Vec<S::Elem>,
        layout: Layout,
    ) -> Result<Self> {
        let shape = D::shape_from_slice(shape)?;
        let size = compute_size(shape.as_ref());
        if data.len() != size {
            return Err(XtensorError::SizeMismatch {
                expected: size,
                found: data.len(),
            });
        }
        Ok(Self::from_parts(S::from_vec(data)?, shape, layout))
    }

    /// Container over `data` with explicit non-negative strides.
    ///
    /// `data` must cover every offset the strides reach. Size-1 axes get
    /// stride 0 regardless of the value passed.
    pub fn from_shape_strides(
        shape: &[usize],
        strides: &[isize],
        data: Vec<S::Elem>,
    ) -> Result<Self> {
        let shape = D::shape_from_slice(shape)?;
        Self::from_parts_strided(S::from_vec(data)?, shape, strides)
    }

    /// Evaluate `expr` into a new container of its broadcast shape.
    pub fn from_expr<E>(expr: E) -> Result<Self>
    where
        E: Expression<Elem = S::Elem>,
        S::Elem: Copy,
    {
        let shape = expr.shape()?;
        let mut out = Self::from_shape(&shape)?;
        assign_data(&mut out, &expr)?;
        Ok(out)
    }

    /// Container from nested arrays or vectors, e.g. `[[1, 2], [3, 4]]`.
    ///
    /// Fails with [`XtensorError::RaggedNested`] when siblings differ in
    /// length.
    pub fn from_nested<N>(nested: N) -> Result<Self>
    where
        N: NestedInit<Elem = S::Elem>,
    {
        let mut shape = Shape::new();
        nested.nested_shape(&mut shape, 0)?;
        let mut data = Vec::with_capacity(compute_size(&shape));
        nested.flatten_into(&mut data);
        Self::from_shape_vec(&shape, data)
    }
}

impl<S, F> XContainer<S, Fixed<F>>
where
    S: OwnedStorage,
    S::Elem: Clone + Default,
    F: FixedShape,
{
    /// Default-initialised container of the fixed shape `F`.
    pub fn new() -> Result<Self> {
        Self::from_shape(F::SHAPE)
    }
}

// ============================================================================
// Assignment
// ============================================================================

impl<S, D> XContainer<S, D>
where
    S: Storage,
    S::Elem: Copy,
    D: Dimension,
{
    /// Resize to the broadcast shape of `expr`, then evaluate it in place.
    ///
    /// Shape errors surface before the container is modified.
    pub fn assign<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        E::Expr: Expression<Elem = S::Elem>,
    {
        let expr = expr.into_expr();
        let shape = expr.shape()?;
        self.resize(&shape)?;
        assign_data(self, &expr)
    }

    /// `self += expr`, broadcasting `expr` into the current shape.
    pub fn add_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Plus: BinaryFunctor<S::Elem, <E::Expr as Expression>::Elem, Output = S::Elem>,
    {
        compound_assign(self, Plus, &expr.into_expr())
    }

    /// `self -= expr`, broadcasting `expr` into the current shape.
    pub fn sub_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Minus: BinaryFunctor<S::Elem, <E::Expr as Expression>::Elem, Output = S::Elem>,
    {
        compound_assign(self, Minus, &expr.into_expr())
    }

    /// `self *= expr`, broadcasting `expr` into the current shape.
    pub fn mul_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Multiplies: BinaryFunctor<S::Elem, <E::Expr as Expression>::Elem, Output = S::Elem>,
    {
        compound_assign(self, Multiplies, &expr.into_expr())
    }

    /// `self /= expr`, broadcasting `expr` into the current shape.
    pub fn div_assign_expr<E>(&mut self, expr: E) -> Result<()>
    where
        E: IntoExpression,
        Divides: BinaryFunctor<S::Elem, <E::Expr as Expression>::Elem, Output = S::Elem>,
    {
        compound_assign(self, Divides, &expr.into_expr())
    }
}

// ============================================================================
// Expression
// ============================================================================

impl<S, D> Expression for XContainer<S, D>
where
    S: Storage,
    S::Elem: Copy,
    D: Dimension,
{
    type Elem = S::Elem;
    type Stepper<'s> = StridedStepper<'s, S::Elem> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.shape().len()
    }

    #[inline]
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        broadcast::broadcast_shape(self.shape(), shape)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        broadcast::is_trivial_broadcast(self.strides(), strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> S::Elem {
        self.storage.as_slice()[data_offset(self.strides(), index) as usize]
    }

    #[inline]
    fn linear(&self, i: usize) -> S::Elem {
        self.storage.as_slice()[i]
    }

    #[inline]
    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        StridedStepper::new(
            self.storage.as_slice(),
            0,
            rank,
            self.strides(),
            self.backstrides(),
        )
    }
}

// ============================================================================
// Indexing
// ============================================================================

/// Unchecked access by a right-aligned multi-index.
///
/// Only the storage bound is enforced: an index outside the shape either
/// panics or reads another element. Use [`XContainer::at`] for checked
/// access.
impl<S: Storage, D: Dimension> Index<&[usize]> for XContainer<S, D> {
    type Output = S::Elem;

    #[inline]
    fn index(&self, index: &[usize]) -> &S::Elem {
        let offset = self.unchecked_offset(index);
        &self.storage.as_slice()[offset]
    }
}

impl<S: Storage, D: Dimension> IndexMut<&[usize]> for XContainer<S, D> {
    #[inline]
    fn index_mut(&mut self, index: &[usize]) -> &mut S::Elem {
        let offset = self.unchecked_offset(index);
        &mut self.storage.as_mut_slice()[offset]
    }
}

impl<S: Storage, D: Dimension> XContainer<S, D> {
    /// Storage offset of a right-aligned index, shape-checked in debug builds only.
    #[inline]
    fn unchecked_offset(&self, index: &[usize]) -> usize {
        debug_assert!(
            index
                .iter()
                .rev()
                .zip(self.shape().iter().rev())
                .all(|(&i, &n)| i < n || n == 1),
            "index {index:?} out of bounds for shape {:?}",
            self.shape()
        );
        data_offset(self.strides(), index) as usize
    }
}

impl<S: Storage, D: Dimension, const N: usize> Index<[usize; N]> for XContainer<S, D> {
    type Output = S::Elem;

    #[inline]
    fn index(&self, index: [usize; N]) -> &S::Elem {
        &self[&index[..]]
    }
}

impl<S: Storage, D: Dimension, const N: usize> IndexMut<[usize; N]> for XContainer<S, D> {
    #[inline]
    fn index_mut(&mut self, index: [usize; N]) -> &mut S::Elem {
        &mut self[&index[..]]
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Row-major iterator over the elements of a strided container.
pub struct Iter<'a, T> {
    data: &'a [T],
    shape: &'a [usize],
    strides: &'a [isize],
    backstrides: &'a [isize],
    index: Shape,
    pos: isize,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(
        data: &'a [T],
        shape: &'a [usize],
        strides: &'a [isize],
        backstrides: &'a [isize],
    ) -> Self {
        Self {
            data,
            shape,
            strides,
            backstrides,
            index: Shape::from_elem(0, shape.len()),
            pos: 0,
            remaining: compute_size(shape),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = &self.data[self.pos as usize];
        self.remaining -= 1;
        for d in (0..self.shape.len()).rev() {
            self.index[d] += 1;
            if self.index[d] < self.shape[d] {
                self.pos += self.strides[d];
                break;
            }
            self.index[d] = 0;
            self.pos -= self.backstrides[d];
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, S: Storage, D: Dimension> IntoIterator for &'a XContainer<S, D> {
    type Item = &'a S::Elem;
    type IntoIter = Iter<'a, S::Elem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Comparison and formatting
// ============================================================================

/// Equal shapes and equal elements; storage kind and layout are ignored.
impl<S1, D1, S2, D2> PartialEq<XContainer<S2, D2>> for XContainer<S1, D1>
where
    S1: Storage,
    S2: Storage,
    D1: Dimension,
    D2: Dimension,
    S1::Elem: PartialEq<S2::Elem>,
{
    fn eq(&self, other: &XContainer<S2, D2>) -> bool {
        self.shape() == other.shape() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<S, D> fmt::Debug for XContainer<S, D>
where
    S: Storage,
    S::Elem: fmt::Debug,
    D: Dimension,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XContainer")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("layout", &self.layout)
            .field("data", &self.data())
            .finish()
    }
}

// ============================================================================
// Nested initialisation
// ============================================================================

/// Nested arrays or vectors usable as container initialisers.
pub trait NestedInit {
    type Elem;

    /// Record the extent of every nesting level, starting at `depth`.
    fn nested_shape(&self, shape: &mut Shape, depth: usize) -> Result<()>;

    /// Append the leaves in row-major order.
    fn flatten_into(self, out: &mut Vec<Self::Elem>);
}

fn record_extent(shape: &mut Shape, depth: usize, len: usize) -> Result<()> {
    if shape.len() == depth {
        shape.push(len);
        Ok(())
    } else if shape[depth] == len {
        Ok(())
    } else {
        Err(XtensorError::RaggedNested)
    }
}

impl<N: NestedInit, const K: usize> NestedInit for [N; K] {
    type Elem = N::Elem;

    fn nested_shape(&self, shape: &mut Shape, depth: usize) -> Result<()> {
        record_extent(shape, depth, K)?;
        self.iter()
            .try_for_each(|child| child.nested_shape(shape, depth + 1))
    }

    fn flatten_into(self, out: &mut Vec<N::Elem>) {
        for child in self {
            child.flatten_into(out);
        }
    }
}

impl<N: NestedInit> NestedInit for Vec<N> {
    type Elem = N::Elem;

    fn nested_shape(&self, shape: &mut Shape, depth: usize) -> Result<()> {
        record_extent(shape, depth, self.len())?;
        self.iter()
            .try_for_each(|child| child.nested_shape(shape, depth + 1))
    }

    fn flatten_into(self, out: &mut Vec<N::Elem>) {
        for child in self {
            child.flatten_into(out);
        }
    }
}

macro_rules! impl_nested_leaf {
    ($($t:ty),*) => {
        $(
            impl NestedInit for $t {
                type Elem = $t;

                #[inline]
                fn nested_shape(&self, shape: &mut Shape, depth: usize) -> Result<()> {
                    if shape.len() == depth {
                        Ok(())
                    } else {
                        Err(XtensorError::RaggedNested)
                    }
                }

                #[inline]
                fn flatten_into(self, out: &mut Vec<$t>) {
                    out.push(self);
                }
            }
        )*
    };
}

impl_nested_leaf!(
    f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool,
    Complex<f32>, Complex<f64>
);

/// Build an [`XArray`] from a nested literal.
///
/// ```
/// use xtensor::{xarray, XArray};
///
/// let a: XArray<i32> = xarray![[1, 2, 3], [4, 5, 6]].unwrap();
/// assert_eq!(a.shape(), &[2, 3]);
/// assert_eq!(a[[1, 0]], 4);
/// ```
#[macro_export]
macro_rules! xarray {
    ($($t:tt)*) => {
        $crate::XArray::from_nested([$($t)*])
    };
}
