//! Element functors applied lazily by expression nodes.
//!
//! Every operator of the expression engine is a zero-sized (or tiny) marker
//! type implementing [`UnaryFunctor`] or [`BinaryFunctor`]. Expression nodes
//! store the functor by value and call it once per evaluated element, so the
//! element type of a node is the functor's `Output` for the operand element
//! types. Keeping functors as named types lets operator overloads spell out
//! their result type without boxing closures.
//!
//! Arithmetic, comparison and extrema functors first bring mixed operands
//! to their common type through [`Promote`].
//!
//! Reductions additionally need an identity element, which [`HasIdentity`]
//! provides for the additive and multiplicative functors.

use std::marker::PhantomData;

use num_traits::{AsPrimitive, Float, One, Signed, Zero};

use crate::promote::Promote;
use crate::scalar::MaybeNan;

// ---------------------------------------------------------------------------
// Functor traits
// ---------------------------------------------------------------------------

/// A functor of one operand.
pub trait UnaryFunctor<A> {
    type Output: Copy;

    fn apply(&self, a: A) -> Self::Output;
}

/// A functor of two operands.
pub trait BinaryFunctor<A, B> {
    type Output: Copy;

    fn apply(&self, a: A, b: B) -> Self::Output;
}

/// Identity element of a binary functor: `f(identity, x) == x`.
pub trait HasIdentity<T> {
    fn identity(&self) -> T;
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// `a + b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plus;

/// `a - b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Minus;

/// `a * b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Multiplies;

/// `a / b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Divides;

macro_rules! impl_arith_functor {
    ($name:ident, $trait:ident, $method:ident) => {
        impl<A, B> BinaryFunctor<A, B> for $name
        where
            A: Promote<B>,
            A::Output: std::ops::$trait<Output = A::Output>,
        {
            type Output = A::Output;

            #[inline(always)]
            fn apply(&self, a: A, b: B) -> Self::Output {
                let (a, b) = a.promote(b);
                std::ops::$trait::$method(a, b)
            }
        }
    };
}

impl_arith_functor!(Plus, Add, add);
impl_arith_functor!(Minus, Sub, sub);
impl_arith_functor!(Multiplies, Mul, mul);
impl_arith_functor!(Divides, Div, div);

impl<T: Zero> HasIdentity<T> for Plus {
    #[inline(always)]
    fn identity(&self) -> T {
        T::zero()
    }
}

impl<T: One> HasIdentity<T> for Multiplies {
    #[inline(always)]
    fn identity(&self) -> T {
        T::one()
    }
}

/// Larger of two values; the left operand wins ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Maximum;

/// Smaller of two values; the left operand wins ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Minimum;

impl<A, B> BinaryFunctor<A, B> for Maximum
where
    A: Promote<B>,
    A::Output: PartialOrd,
{
    type Output = A::Output;

    #[inline(always)]
    fn apply(&self, a: A, b: B) -> A::Output {
        let (a, b) = a.promote(b);
        if b > a {
            b
        } else {
            a
        }
    }
}

impl<A, B> BinaryFunctor<A, B> for Minimum
where
    A: Promote<B>,
    A::Output: PartialOrd,
{
    type Output = A::Output;

    #[inline(always)]
    fn apply(&self, a: A, b: B) -> A::Output {
        let (a, b) = a.promote(b);
        if b < a {
            b
        } else {
            a
        }
    }
}

/// `(a - b)^2`, the summand of a variance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredDiff;

impl<T> BinaryFunctor<T, T> for SquaredDiff
where
    T: Copy + std::ops::Sub<Output = T> + std::ops::Mul<Output = T>,
{
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T, b: T) -> T {
        let d = a - b;
        d * d
    }
}

// ---------------------------------------------------------------------------
// Comparison and logic
// ---------------------------------------------------------------------------

macro_rules! impl_compare_functor {
    ($(#[$doc:meta] $name:ident, $bound:ident, $op:tt;)*) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl<A, B> BinaryFunctor<A, B> for $name
            where
                A: Promote<B>,
                A::Output: $bound,
            {
                type Output = bool;

                #[inline(always)]
                fn apply(&self, a: A, b: B) -> bool {
                    let (a, b) = a.promote(b);
                    a $op b
                }
            }
        )*
    };
}

impl_compare_functor! {
    /// `a == b`
    Equal, PartialEq, ==;
    /// `a != b`
    NotEqual, PartialEq, !=;
    /// `a < b`
    Less, PartialOrd, <;
    /// `a <= b`
    LessEqual, PartialOrd, <=;
    /// `a > b`
    Greater, PartialOrd, >;
    /// `a >= b`
    GreaterEqual, PartialOrd, >=;
}

/// `a && b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalAnd;

/// `a || b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalOr;

impl BinaryFunctor<bool, bool> for LogicalAnd {
    type Output = bool;

    #[inline(always)]
    fn apply(&self, a: bool, b: bool) -> bool {
        a && b
    }
}

impl BinaryFunctor<bool, bool> for LogicalOr {
    type Output = bool;

    #[inline(always)]
    fn apply(&self, a: bool, b: bool) -> bool {
        a || b
    }
}

/// `a & b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitAnd;

/// `a | b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitOr;

impl_arith_functor!(BitAnd, BitAnd, bitand);
impl_arith_functor!(BitOr, BitOr, bitor);

// ---------------------------------------------------------------------------
// Unary functors
// ---------------------------------------------------------------------------

/// `-a`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negate;

impl<A> UnaryFunctor<A> for Negate
where
    A: std::ops::Neg,
    A::Output: Copy,
{
    type Output = A::Output;

    #[inline(always)]
    fn apply(&self, a: A) -> Self::Output {
        -a
    }
}

/// `!a`: logical not for `bool`, bitwise not for integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalNot;

impl<A> UnaryFunctor<A> for LogicalNot
where
    A: std::ops::Not,
    A::Output: Copy,
{
    type Output = A::Output;

    #[inline(always)]
    fn apply(&self, a: A) -> Self::Output {
        !a
    }
}

/// `|a|` for signed types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Abs;

impl<T: Signed + Copy> UnaryFunctor<T> for Abs {
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T) -> T {
        a.abs()
    }
}

macro_rules! impl_float_functor {
    ($(#[$doc:meta] $name:ident => $method:ident;)*) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl<T: Float> UnaryFunctor<T> for $name {
                type Output = T;

                #[inline(always)]
                fn apply(&self, a: T) -> T {
                    a.$method()
                }
            }
        )*
    };
}

impl_float_functor! {
    /// Square root.
    Sqrt => sqrt;
    /// Natural exponential.
    Exp => exp;
    /// Natural logarithm.
    Ln => ln;
    /// Sine.
    Sin => sin;
    /// Cosine.
    Cos => cos;
}

/// `a^n` for an integer exponent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowI(pub i32);

impl<T: Float> UnaryFunctor<T> for PowI {
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T) -> T {
        a.powi(self.0)
    }
}

/// `a^p` for a floating point exponent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowF<T>(pub T);

impl<T: Float> UnaryFunctor<T> for PowF<T> {
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T) -> T {
        a.powf(self.0)
    }
}

/// Primitive numeric conversion `a as U`.
pub struct Cast<U>(PhantomData<fn() -> U>);

impl<U> Cast<U> {
    pub fn new() -> Self {
        Cast(PhantomData)
    }
}

impl<U> Default for Cast<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for Cast<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Cast<U> {}

impl<U> std::fmt::Debug for Cast<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cast<{}>", std::any::type_name::<U>())
    }
}

impl<T, U> UnaryFunctor<T> for Cast<U>
where
    T: AsPrimitive<U>,
    U: Copy + 'static,
{
    type Output = U;

    #[inline(always)]
    fn apply(&self, a: T) -> U {
        a.as_()
    }
}

/// `1` where the operand is a number, `0` where it is NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotNan;

impl<T: MaybeNan + Zero + One> UnaryFunctor<T> for NotNan {
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T) -> T {
        if a.has_nan() {
            T::zero()
        } else {
            T::one()
        }
    }
}

// ---------------------------------------------------------------------------
// NaN skipping
// ---------------------------------------------------------------------------

/// Wraps a reducing functor so NaN operands are replaced by the functor's
/// identity before combining.
///
/// `NanSkip(Plus)` drives `nansum` and `nancumsum`, `NanSkip(Multiplies)`
/// drives `nanprod` and `nancumprod`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NanSkip<F>(pub F);

impl<T, F> BinaryFunctor<T, T> for NanSkip<F>
where
    T: MaybeNan,
    F: BinaryFunctor<T, T, Output = T> + HasIdentity<T>,
{
    type Output = T;

    #[inline(always)]
    fn apply(&self, a: T, b: T) -> T {
        let a = if a.has_nan() { self.0.identity() } else { a };
        let b = if b.has_nan() { self.0.identity() } else { b };
        self.0.apply(a, b)
    }
}

impl<T, F: HasIdentity<T>> HasIdentity<T> for NanSkip<F> {
    #[inline(always)]
    fn identity(&self) -> T {
        self.0.identity()
    }
}
