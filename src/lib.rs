//! Multidimensional arrays with NumPy-style broadcasting and lazy expressions.
//!
//! The crate is organised leaves first:
//!
//! - Storage backends: [`UVector`], [`SVector`], [`AlignedArray`] and the buffer
//!   adaptors [`BorrowedBuffer`], [`OwnedBuffer`], [`SharedBuffer`]
//! - Shapes and strides: [`Shape`], [`Layout`], [`compute_strides`] and the
//!   compile-time [`FixedShape`] descriptors ([`Fix1`] .. [`Fix4`])
//! - Containers: [`XArray`] (dynamic rank), [`XTensor`] (static rank) and
//!   [`XTensorFixed`] (compile-time shape), all instances of [`XContainer`]
//! - Expressions: [`Expression`], the lazy nodes [`XUnary`], [`XBinary`],
//!   [`XBroadcast`] and the operator overloads building them
//! - Reductions and accumulations: [`XReducer`], [`sum`], [`amax`], [`mean`],
//!   [`norm_l2`], [`cumsum`], ...
//! - Adaptors: [`adapt`], [`adapt_slice`], [`adapt_vec`], [`adapt_shared`]
//! - Views: [`StridedView`] and [`StridedViewMut`], sliced with [`Slice`]
//!   arguments or the [`s!`] macro, plus `squeeze`, `expand_dims` and `flip`
//! - Builders: [`zeros`], [`ones`], [`eye`], [`arange`], [`linspace`]
//!
//! # Example
//!
//! ```rust
//! use xtensor::{sum, xarray, Axes, Expression, ReducerOptions, XArray};
//!
//! let a: XArray<f64> = xarray![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].unwrap();
//! let b: XArray<f64> = xarray![10.0, 20.0, 30.0].unwrap();
//!
//! // Nothing is computed until the expression is assigned or evaluated.
//! let c = XArray::from_expr(&a + &b).unwrap();
//! assert_eq!(c.shape(), &[2, 3]);
//! assert_eq!(c[[1, 2]], 36.0);
//!
//! let s = sum(&a, Axes::from([0]), ReducerOptions::default()).unwrap();
//! assert_eq!(s.shape().unwrap().as_slice(), &[3]);
//! assert_eq!(s.element(&[1]), 7.0);
//! ```
//!
//! # Evaluation
//!
//! Building an expression performs no work. Assignment computes the
//! broadcast shape of the expression once, resizes the destination, then
//! fills it either with a flat linear loop (when every operand shares the
//! destination's strides) or with a stepper walk over the multi-index.
//! All structural errors surface before the destination is touched.
//!
//! # Aliasing
//!
//! Adaptors over borrowed or co-owned memory do not track the lifetime of
//! memory handed over as raw pointers. A raw-pointer adaptor outliving its
//! source is undefined behaviour; the unsafe constructors document this.

mod accumulator;
mod adapt;
mod assign;
pub mod broadcast;
mod builder;
mod container;
mod expression;
mod function;
pub mod layout;
mod math;
mod operators;
mod reducer;
pub mod shape;
mod slice;
pub mod storage;
pub mod strides;
mod view;

pub use xtensor_traits as traits;
pub use xtensor_traits::{
    BinaryFunctor, HasIdentity, MaybeNan, Norm, ScalarBase, UnaryFunctor,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::{
    AlignedArray, BorrowedBuffer, OwnedBuffer, OwnedStorage, SVector, SharedBuffer, Storage,
    UVector,
};

// ============================================================================
// Shapes, strides and broadcasting
// ============================================================================
pub use broadcast::{broadcast_shape, broadcast_shapes, is_trivial_broadcast};
pub use layout::Layout;
pub use shape::{
    broadcast_fixed, Dimension, Dyn, Fix1, Fix2, Fix3, Fix4, Fixed, FixedShape, Rank, Shape,
    Strides,
};
pub use strides::{
    compute_backstrides, compute_size, compute_strides, data_offset, ravel_index, unravel_index,
};

// ============================================================================
// Containers, views and adaptors
// ============================================================================
pub use adapt::{
    adapt, adapt_acquire, adapt_owner, adapt_ptr, adapt_shared, adapt_slice, adapt_strided,
    adapt_vec, adapt_with_destructor, adapt_with_layout, AdaptShape,
};
pub use container::{
    NestedInit, XArray, XArrayAdaptor, XContainer, XTensor, XTensorAdaptor, XTensorFixed,
};
pub use builder::{arange, eye, eye_k, linspace, ones, zeros};
pub use slice::Slice;
pub use view::{StridedView, StridedViewMut};

// ============================================================================
// Expressions
// ============================================================================
pub use expression::{
    ExprIter, Expression, IntoExpression, Scalar, ScalarStepper, Stepper, StridedStepper,
};
pub use function::{
    abs, all, allclose, any, broadcast_to, cast, cos, equal, eval, exp, greater, greater_equal,
    less, less_equal, ln, logical_and, logical_not, logical_or, map, maximum, minimum,
    not_equal, powi, sin, sqrt, zip_with, Closure, XBinary, XBroadcast, XUnary,
};

// ============================================================================
// Reductions and accumulations
// ============================================================================
pub use accumulator::{accumulate, cumprod, cumsum, nancumprod, nancumsum};
pub use math::{
    amax, amin, mean, nanmean, nanprod, nansum, norm_l0, norm_l1, norm_l2, norm_linf, norm_lp,
    norm_sq, prod, stddev, sum, variance, Mean, NanMean, NormL2, NormLp, StdDev, Variance,
};
pub use reducer::{reduce, Axes, EvaluationStrategy, ReducerOptions, ReducingIter, XReducer};

#[cfg(feature = "parallel")]
pub use assign::par_assign;

// ============================================================================
// Constants
// ============================================================================

/// Layout used when none is requested explicitly.
pub const DEFAULT_LAYOUT: Layout = Layout::RowMajor;

/// Inline capacity of the small vectors holding shapes and strides.
///
/// Ranks up to this value never touch the heap.
pub const SVECTOR_INLINE: usize = 4;

/// Alignment in bytes of [`AlignedArray`] storage.
pub const STORAGE_ALIGNMENT: usize = 32;

/// Minimum element count before `par_assign` splits work across threads.
pub const PAR_THRESHOLD: usize = 1 << 15;

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by container construction, assignment and reduction.
///
/// Every variant describes a structural precondition that was violated by
/// the request that returned it. No operation leaves a container partially
/// modified when it fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XtensorError {
    /// Ranks do not match (expected, found).
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Two operands disagree on a non-1 extent of the same axis.
    #[error("cannot broadcast shape {lhs:?} against {rhs:?}")]
    BroadcastMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Axis index out of range for the given rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// The same axis appears twice in an axis set.
    #[error("duplicate axis {0}")]
    DuplicateAxis(usize),

    /// A permutation is not a bijection over `0..rank`.
    #[error("invalid permutation {0:?}")]
    InvalidPermutation(Vec<usize>),

    /// Stride array length doesn't match the shape length.
    #[error("stride and shape length mismatch")]
    StrideLengthMismatch,

    /// Negative strides are only accepted by views.
    #[error("negative stride on axis {axis}")]
    NegativeStride { axis: usize },

    /// Integer overflow or out of range offset while validating strides.
    #[error("offset out of range for the underlying buffer")]
    OffsetOverflow,

    /// Checked element access outside the shape.
    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    /// Resize requested on a buffer whose extent is fixed by its source.
    #[error("buffer of length {len} is not resizable (requested {requested})")]
    NotResizable { len: usize, requested: usize },

    /// Resize or reshape of a fixed-shape container to another shape.
    #[error("fixed shape {fixed:?} cannot become {requested:?}")]
    FixedShape {
        fixed: Vec<usize>,
        requested: Vec<usize>,
    },

    /// Element count does not match the requested shape.
    #[error("size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    /// Nested input whose sub-sequences have different lengths.
    #[error("nested initializer is ragged")]
    RaggedNested,

    /// Reduction without an initial value over zero elements.
    #[error("reduction over an empty axis set requires an initial value")]
    EmptyReduction,

    /// Accumulation axis outside the expression's rank.
    #[error("axis {axis} larger than expression dimension {rank} in accumulator")]
    AccumulatorAxis { axis: usize, rank: usize },

    /// Slice index outside the extent of its axis.
    #[error("index {index} out of bounds for axis {axis} of extent {extent}")]
    SliceOutOfBounds {
        axis: usize,
        index: isize,
        extent: usize,
    },

    /// More axis-consuming slices than the view has axes.
    #[error("{count} slices given for a view of rank {rank}")]
    TooManySlices { count: usize, rank: usize },

    /// A slice argument holds more than one ellipsis.
    #[error("a slice may contain at most one ellipsis")]
    MultipleEllipsis,

    /// Range or slice step of zero.
    #[error("step must not be zero")]
    ZeroStep,

    /// Squeezing an axis whose extent is not 1.
    #[error("cannot squeeze axis {axis} of extent {extent}")]
    NotSqueezable { axis: usize, extent: usize },

    /// A count could not be represented in the element type.
    #[error("failed to convert scalar")]
    ScalarConversion,
}

/// Result type for xtensor operations.
pub type Result<T> = std::result::Result<T, XtensorError>;
