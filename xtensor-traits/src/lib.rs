//! Shared traits for the xtensor-rs workspace.
//!
//! This crate holds the element-level vocabulary the expression engine is
//! generic over:
//!
//! - [`ScalarBase`] and [`MaybeNan`]: bounds for element types
//! - [`UnaryFunctor`] / [`BinaryFunctor`]: functor marker types such as
//!   [`Plus`] or [`Maximum`] applied lazily by expression nodes
//! - [`Promote`]: common type of mixed operands
//! - [`HasIdentity`]: identity elements used by reductions and NaN-skipping
//!   accumulations
//! - [`Norm`]: per-scalar norm kernels for real and complex types
//!
//! External crates can depend on `xtensor-traits` to implement these traits
//! for their own scalar types without orphan rule violations.

pub mod functor;
pub mod norm;
pub mod promote;
pub mod scalar;

pub use functor::{
    Abs, BinaryFunctor, BitAnd, BitOr, Cast, Cos, Divides, Equal, Exp, Greater, GreaterEqual,
    HasIdentity, Less, LessEqual, Ln, LogicalAnd, LogicalNot, LogicalOr, Maximum, Minimum, Minus,
    Multiplies, NanSkip, Negate, NotEqual, NotNan, Plus, PowF, PowI, Sin, Sqrt, SquaredDiff,
    UnaryFunctor,
};
pub use norm::{Norm, NormAbs, NormNonZero, NormPow, NormSq};
pub use promote::Promote;
pub use scalar::{MaybeNan, ScalarBase};
