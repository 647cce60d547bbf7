//! Elementwise expression nodes and the named functions building them.
//!
//! [`XUnary`] and [`XBinary`] apply a functor to their operands one element
//! at a time; [`XBroadcast`] presents an expression at a larger shape.
//! None of them evaluates anything on construction.

use num_traits::Float;
use xtensor_traits::{
    Abs, BinaryFunctor, Cast, Cos, Equal, Exp, Greater, GreaterEqual, Less, LessEqual, Ln,
    LogicalAnd, LogicalNot, LogicalOr, Maximum, Minimum, NotEqual, PowI, Sin, Sqrt, UnaryFunctor,
};

use crate::broadcast::broadcast_shape;
use crate::container::XArray;
use crate::expression::{Expression, IntoExpression, Stepper};
use crate::shape::Shape;
use crate::{Result, XtensorError};

// ============================================================================
// Unary node
// ============================================================================

/// Lazy `f(e)`.
#[derive(Debug, Clone, Copy)]
pub struct XUnary<F, E> {
    functor: F,
    expr: E,
}

impl<F, E> XUnary<F, E> {
    pub fn new(functor: F, expr: E) -> Self {
        Self { functor, expr }
    }

    pub fn functor(&self) -> &F {
        &self.functor
    }

    pub fn expr(&self) -> &E {
        &self.expr
    }
}

impl<F, E> Expression for XUnary<F, E>
where
    E: Expression,
    F: UnaryFunctor<E::Elem>,
{
    type Elem = F::Output;
    type Stepper<'s> = UnaryStepper<'s, F, E::Stepper<'s>> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.expr.dimension()
    }

    #[inline]
    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        self.expr.broadcast_shape(shape)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        self.expr.is_trivial_broadcast(strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> F::Output {
        self.functor.apply(self.expr.element(index))
    }

    #[inline]
    fn linear(&self, i: usize) -> F::Output {
        self.functor.apply(self.expr.linear(i))
    }

    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        UnaryStepper {
            functor: &self.functor,
            inner: self.expr.stepper(rank),
        }
    }
}

/// Stepper of an [`XUnary`].
pub struct UnaryStepper<'s, F, S> {
    functor: &'s F,
    inner: S,
}

impl<F, S> Stepper for UnaryStepper<'_, F, S>
where
    S: Stepper,
    F: UnaryFunctor<S::Elem>,
{
    type Elem = F::Output;

    #[inline]
    fn step(&mut self, dim: usize) {
        self.inner.step(dim);
    }

    #[inline]
    fn reset(&mut self, dim: usize) {
        self.inner.reset(dim);
    }

    #[inline]
    fn value(&self) -> F::Output {
        self.functor.apply(self.inner.value())
    }
}

// ============================================================================
// Binary node
// ============================================================================

/// Lazy `f(lhs, rhs)` over the broadcast of both operands.
#[derive(Debug, Clone, Copy)]
pub struct XBinary<F, L, R> {
    functor: F,
    lhs: L,
    rhs: R,
}

impl<F, L, R> XBinary<F, L, R> {
    pub fn new(functor: F, lhs: L, rhs: R) -> Self {
        Self { functor, lhs, rhs }
    }

    pub fn functor(&self) -> &F {
        &self.functor
    }

    pub fn lhs(&self) -> &L {
        &self.lhs
    }

    pub fn rhs(&self) -> &R {
        &self.rhs
    }
}

impl<F, L, R> Expression for XBinary<F, L, R>
where
    L: Expression,
    R: Expression,
    F: BinaryFunctor<L::Elem, R::Elem>,
{
    type Elem = F::Output;
    type Stepper<'s> = BinaryStepper<'s, F, L::Stepper<'s>, R::Stepper<'s>> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.lhs.dimension().max(self.rhs.dimension())
    }

    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        let lhs = self.lhs.broadcast_shape(shape)?;
        let rhs = self.rhs.broadcast_shape(shape)?;
        Ok(lhs && rhs)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        self.lhs.is_trivial_broadcast(strides) && self.rhs.is_trivial_broadcast(strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> F::Output {
        self.functor
            .apply(self.lhs.element(index), self.rhs.element(index))
    }

    #[inline]
    fn linear(&self, i: usize) -> F::Output {
        self.functor.apply(self.lhs.linear(i), self.rhs.linear(i))
    }

    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        BinaryStepper {
            functor: &self.functor,
            lhs: self.lhs.stepper(rank),
            rhs: self.rhs.stepper(rank),
        }
    }
}

/// Stepper of an [`XBinary`]; moves both operand steppers together.
pub struct BinaryStepper<'s, F, A, B> {
    functor: &'s F,
    lhs: A,
    rhs: B,
}

impl<F, A, B> Stepper for BinaryStepper<'_, F, A, B>
where
    A: Stepper,
    B: Stepper,
    F: BinaryFunctor<A::Elem, B::Elem>,
{
    type Elem = F::Output;

    #[inline]
    fn step(&mut self, dim: usize) {
        self.lhs.step(dim);
        self.rhs.step(dim);
    }

    #[inline]
    fn reset(&mut self, dim: usize) {
        self.lhs.reset(dim);
        self.rhs.reset(dim);
    }

    #[inline]
    fn value(&self) -> F::Output {
        self.functor.apply(self.lhs.value(), self.rhs.value())
    }
}

// ============================================================================
// Broadcast node
// ============================================================================

/// An expression presented at a larger, broadcast-compatible shape.
#[derive(Debug, Clone)]
pub struct XBroadcast<E> {
    expr: E,
    shape: Shape,
    same_shape: bool,
}

impl<E> XBroadcast<E> {
    pub fn expr(&self) -> &E {
        &self.expr
    }
}

impl<E: Expression> Expression for XBroadcast<E> {
    type Elem = E::Elem;
    type Stepper<'s> = E::Stepper<'s> where Self: 's;

    #[inline]
    fn dimension(&self) -> usize {
        self.shape.len()
    }

    fn broadcast_shape(&self, shape: &mut [usize]) -> Result<bool> {
        let trivial = broadcast_shape(&self.shape, shape)?;
        Ok(trivial && self.same_shape)
    }

    #[inline]
    fn is_trivial_broadcast(&self, strides: &[isize]) -> bool {
        self.same_shape && self.expr.is_trivial_broadcast(strides)
    }

    #[inline]
    fn element(&self, index: &[usize]) -> E::Elem {
        self.expr.element(index)
    }

    #[inline]
    fn linear(&self, i: usize) -> E::Elem {
        self.expr.linear(i)
    }

    #[inline]
    fn stepper(&self, rank: usize) -> Self::Stepper<'_> {
        self.expr.stepper(rank)
    }
}

/// Present `expr` at `shape`.
///
/// Fails with [`XtensorError::BroadcastMismatch`] unless `expr` broadcasts
/// to exactly `shape`.
pub fn broadcast_to<E: IntoExpression>(expr: E, shape: &[usize]) -> Result<XBroadcast<E::Expr>> {
    let expr = expr.into_expr();
    let own = expr.shape()?;
    let mut out = Shape::from_slice(shape);
    broadcast_shape(&own, &mut out)?;
    if out.as_slice() != shape {
        return Err(XtensorError::BroadcastMismatch {
            lhs: own.to_vec(),
            rhs: shape.to_vec(),
        });
    }
    Ok(XBroadcast {
        expr,
        same_shape: own.as_slice() == shape,
        shape: out,
    })
}

// ============================================================================
// Closures
// ============================================================================

/// Adapts a closure to [`UnaryFunctor`] or [`BinaryFunctor`].
#[derive(Debug, Clone, Copy)]
pub struct Closure<F>(pub F);

impl<F, A, O> UnaryFunctor<A> for Closure<F>
where
    F: Fn(A) -> O,
    O: Copy,
{
    type Output = O;

    #[inline(always)]
    fn apply(&self, a: A) -> O {
        (self.0)(a)
    }
}

impl<F, A, B, O> BinaryFunctor<A, B> for Closure<F>
where
    F: Fn(A, B) -> O,
    O: Copy,
{
    type Output = O;

    #[inline(always)]
    fn apply(&self, a: A, b: B) -> O {
        (self.0)(a, b)
    }
}

/// Lazy `f(e)` for an arbitrary closure.
pub fn map<E, F>(expr: E, f: F) -> XUnary<Closure<F>, E::Expr>
where
    E: IntoExpression,
{
    XUnary::new(Closure(f), expr.into_expr())
}

/// Lazy `f(lhs, rhs)` for an arbitrary closure.
pub fn zip_with<L, R, F>(lhs: L, rhs: R, f: F) -> XBinary<Closure<F>, L::Expr, R::Expr>
where
    L: IntoExpression,
    R: IntoExpression,
{
    XBinary::new(Closure(f), lhs.into_expr(), rhs.into_expr())
}

// ============================================================================
// Named functions
// ============================================================================

macro_rules! binary_function {
    ($($(#[$doc:meta])* $name:ident => $functor:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<L, R>(lhs: L, rhs: R) -> XBinary<$functor, L::Expr, R::Expr>
            where
                L: IntoExpression,
                R: IntoExpression,
            {
                XBinary::new($functor, lhs.into_expr(), rhs.into_expr())
            }
        )*
    };
}

binary_function! {
    /// Elementwise `lhs == rhs`.
    equal => Equal;
    /// Elementwise `lhs != rhs`.
    not_equal => NotEqual;
    /// Elementwise `lhs < rhs`.
    less => Less;
    /// Elementwise `lhs <= rhs`.
    less_equal => LessEqual;
    /// Elementwise `lhs > rhs`.
    greater => Greater;
    /// Elementwise `lhs >= rhs`.
    greater_equal => GreaterEqual;
    /// Elementwise `lhs && rhs` over booleans.
    logical_and => LogicalAnd;
    /// Elementwise `lhs || rhs` over booleans.
    logical_or => LogicalOr;
    /// Elementwise maximum.
    maximum => Maximum;
    /// Elementwise minimum.
    minimum => Minimum;
}

macro_rules! unary_function {
    ($($(#[$doc:meta])* $name:ident => $functor:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<E: IntoExpression>(expr: E) -> XUnary<$functor, E::Expr> {
                XUnary::new($functor, expr.into_expr())
            }
        )*
    };
}

unary_function! {
    /// Elementwise `!e`.
    logical_not => LogicalNot;
    /// Elementwise absolute value.
    abs => Abs;
    /// Elementwise square root.
    sqrt => Sqrt;
    /// Elementwise `e^x`.
    exp => Exp;
    /// Elementwise natural logarithm.
    ln => Ln;
    /// Elementwise sine.
    sin => Sin;
    /// Elementwise cosine.
    cos => Cos;
}

/// Elementwise integer power.
pub fn powi<E: IntoExpression>(expr: E, n: i32) -> XUnary<PowI, E::Expr> {
    XUnary::new(PowI(n), expr.into_expr())
}

/// Elementwise primitive conversion to `U`.
///
/// Operators never promote mixed element types; convert one side first.
pub fn cast<U, E: IntoExpression>(expr: E) -> XUnary<Cast<U>, E::Expr> {
    XUnary::new(Cast::new(), expr.into_expr())
}

// ============================================================================
// Evaluation and predicates
// ============================================================================

/// Evaluate an expression into a new row-major [`XArray`].
pub fn eval<E>(expr: E) -> Result<XArray<<E::Expr as Expression>::Elem>>
where
    E: IntoExpression,
    <E::Expr as Expression>::Elem: Clone + Default,
{
    XArray::from_expr(expr.into_expr())
}

/// Whether every element is `true`; `true` for empty expressions.
pub fn all<E>(expr: E) -> Result<bool>
where
    E: IntoExpression,
    E::Expr: Expression<Elem = bool>,
{
    let expr = expr.into_expr();
    let mut it = expr.iter()?;
    Ok(it.all(|v| v))
}

/// Whether any element is `true`; `false` for empty expressions.
pub fn any<E>(expr: E) -> Result<bool>
where
    E: IntoExpression,
    E::Expr: Expression<Elem = bool>,
{
    let expr = expr.into_expr();
    let mut it = expr.iter()?;
    Ok(it.any(|v| v))
}

/// Whether `|a - b| <= atol + rtol * |b|` holds elementwise.
///
/// The operands are broadcast together; incompatible shapes are an error
/// rather than `false`. NaN never compares close.
pub fn allclose<L, R, T>(lhs: L, rhs: R, rtol: T, atol: T) -> Result<bool>
where
    L: IntoExpression,
    R: IntoExpression,
    L::Expr: Expression<Elem = T>,
    R::Expr: Expression<Elem = T>,
    T: Float,
{
    all(zip_with(lhs, rhs, move |a: T, b: T| {
        (a - b).abs() <= atol + rtol * b.abs()
    }))
}
