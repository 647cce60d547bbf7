//! Named reductions: sums, extrema, statistics and norms.
//!
//! Each function is a thin instantiation of [`reduce`] with a functor and,
//! where one exists, the functor's identity as default initial value. An
//! `initial` given in the options takes precedence and is folded in.

use num_traits::{Float, FromPrimitive};
use xtensor_traits::{
    Divides, HasIdentity, MaybeNan, Maximum, Minimum, Multiplies, NanSkip, Norm, NormAbs,
    NormNonZero, NormPow, NormSq, NotNan, Plus, PowF, Sqrt, SquaredDiff,
};

use crate::container::XArray;
use crate::expression::{Expression, IntoExpression, Scalar};
use crate::function::{XBinary, XUnary};
use crate::reducer::{reduce, reduced_count, Axes, ReducerOptions, XReducer};
use crate::{Result, XtensorError};

type Elem<E> = <<E as IntoExpression>::Expr as Expression>::Elem;
type Real<T> = <T as Norm>::Real;

/// Options with `initial` defaulted to the functor's identity.
fn with_identity<T, F: HasIdentity<T>>(functor: &F, mut options: ReducerOptions<T>) -> ReducerOptions<T> {
    if options.initial.is_none() {
        options.initial = Some(functor.identity());
    }
    options
}

/// Element count folded into each result element, in the element type.
///
/// Averages over nothing fail with [`XtensorError::EmptyReduction`]
/// instead of dividing by zero.
fn count_as<T: FromPrimitive>(shape: &[usize], axes: &Axes) -> Result<T> {
    let axes = axes.resolve(shape.len())?;
    match reduced_count(shape, &axes) {
        0 => Err(XtensorError::EmptyReduction),
        count => T::from_usize(count).ok_or(XtensorError::ScalarConversion),
    }
}

// ============================================================================
// Sums and products
// ============================================================================

/// Sum over `axes`; 0 for empty reductions.
pub fn sum<E, A>(expr: E, axes: A, options: ReducerOptions<Elem<E>>) -> Result<XReducer<Plus, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Plus: HasIdentity<Elem<E>>,
    Elem<E>: std::ops::Add<Output = Elem<E>>,
{
    reduce(Plus, expr, axes, with_identity(&Plus, options))
}

/// Product over `axes`; 1 for empty reductions.
pub fn prod<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<XReducer<Multiplies, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Multiplies: HasIdentity<Elem<E>>,
    Elem<E>: std::ops::Mul<Output = Elem<E>>,
{
    reduce(Multiplies, expr, axes, with_identity(&Multiplies, options))
}

/// Sum treating NaN as 0.
pub fn nansum<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<XReducer<NanSkip<Plus>, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: MaybeNan + std::ops::Add<Output = Elem<E>>,
    Plus: HasIdentity<Elem<E>>,
{
    let functor = NanSkip(Plus);
    let options = with_identity(&functor, options);
    reduce(functor, expr, axes, options)
}

/// Product treating NaN as 1.
pub fn nanprod<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<XReducer<NanSkip<Multiplies>, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: MaybeNan + std::ops::Mul<Output = Elem<E>>,
    Multiplies: HasIdentity<Elem<E>>,
{
    let functor = NanSkip(Multiplies);
    let options = with_identity(&functor, options);
    reduce(functor, expr, axes, options)
}

// ============================================================================
// Extrema
// ============================================================================

/// Maximum over `axes`. Without an initial value an empty reduction fails
/// with [`XtensorError::EmptyReduction`].
pub fn amax<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<XReducer<Maximum, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: PartialOrd,
{
    reduce(Maximum, expr, axes, options)
}

/// Minimum over `axes`. Without an initial value an empty reduction fails
/// with [`XtensorError::EmptyReduction`].
pub fn amin<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<XReducer<Minimum, E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: PartialOrd,
{
    reduce(Minimum, expr, axes, options)
}

// ============================================================================
// Statistics
// ============================================================================

/// Lazy mean: a sum divided by the element count.
pub type Mean<E> = XBinary<Divides, XReducer<Plus, E>, Scalar<<E as Expression>::Elem>>;

/// Lazy NaN-ignoring mean: a NaN-skipping sum divided by the count of
/// non-NaN elements.
pub type NanMean<E> = XBinary<
    Divides,
    XReducer<NanSkip<Plus>, E>,
    XReducer<Plus, XUnary<NotNan, E>>,
>;

/// Lazy variance around a mean evaluated at construction.
pub type Variance<E> = XBinary<
    Divides,
    XReducer<Plus, XBinary<SquaredDiff, E, XArray<<E as Expression>::Elem>>>,
    Scalar<<E as Expression>::Elem>,
>;

/// Lazy standard deviation.
pub type StdDev<E> = XUnary<Sqrt, Variance<E>>;

/// Arithmetic mean over `axes`. Integer elements use integer division.
///
/// Fails with [`XtensorError::EmptyReduction`] when the reduced axes hold
/// no element.
pub fn mean<E, A>(expr: E, axes: A, options: ReducerOptions<Elem<E>>) -> Result<Mean<E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Plus: HasIdentity<Elem<E>>,
    Elem<E>: FromPrimitive + std::ops::Add<Output = Elem<E>> + std::ops::Div<Output = Elem<E>>,
{
    let axes = axes.into();
    let total = sum(expr, axes.clone(), options)?;
    let count = count_as(total.source_shape(), &axes)?;
    Ok(XBinary::new(Divides, total, Scalar(count)))
}

/// Mean over `axes` ignoring NaN elements.
///
/// A result element with no number to average is NaN.
pub fn nanmean<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<NanMean<E::Expr>>
where
    E: IntoExpression,
    E::Expr: Clone,
    A: Into<Axes>,
    Elem<E>: Float + MaybeNan,
{
    let expr = expr.into_expr();
    let axes = axes.into();
    let counts = ReducerOptions {
        strategy: options.strategy,
        keep_dims: options.keep_dims,
        initial: None,
    };
    let total = nansum(expr.clone(), axes.clone(), options)?;
    let count = sum(XUnary::new(NotNan, expr), axes, counts)?;
    Ok(XBinary::new(Divides, total, count))
}

/// Population variance over `axes`.
///
/// The mean is evaluated once, with reduced axes kept so it broadcasts
/// back against `expr`. `options` apply to the outer sum of squares.
pub fn variance<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Elem<E>>,
) -> Result<Variance<E::Expr>>
where
    E: IntoExpression,
    E::Expr: Clone,
    A: Into<Axes>,
    Elem<E>: Float + FromPrimitive + Default,
{
    let expr = expr.into_expr();
    let axes = axes.into();
    let centre = mean(
        expr.clone(),
        axes.clone(),
        ReducerOptions::default().keep_dims(true),
    )?;
    let centre = XArray::from_expr(centre)?;
    let squares = sum(XBinary::new(SquaredDiff, expr, centre), axes.clone(), options)?;
    let count = count_as(squares.source_shape(), &axes)?;
    Ok(XBinary::new(Divides, squares, Scalar(count)))
}

/// Population standard deviation over `axes`.
pub fn stddev<E, A>(expr: E, axes: A, options: ReducerOptions<Elem<E>>) -> Result<StdDev<E::Expr>>
where
    E: IntoExpression,
    E::Expr: Clone,
    A: Into<Axes>,
    Elem<E>: Float + FromPrimitive + Default,
{
    Ok(XUnary::new(Sqrt, variance(expr, axes, options)?))
}

// ============================================================================
// Norms
// ============================================================================

/// Lazy L2 norm.
pub type NormL2<E> = XUnary<Sqrt, XReducer<Plus, XUnary<NormSq, E>>>;

/// Lazy Lp norm.
pub type NormLp<E> = XUnary<
    PowF<Real<<E as Expression>::Elem>>,
    XReducer<Plus, XUnary<NormPow<Real<<E as Expression>::Elem>>, E>>,
>;

/// Number of nonzero elements, in the norm's real type.
pub fn norm_l0<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Real<Elem<E>>>,
) -> Result<XReducer<Plus, XUnary<NormNonZero, E::Expr>>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    sum(XUnary::new(NormNonZero, expr.into_expr()), axes, options)
}

/// Sum of magnitudes.
pub fn norm_l1<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Real<Elem<E>>>,
) -> Result<XReducer<Plus, XUnary<NormAbs, E::Expr>>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    sum(XUnary::new(NormAbs, expr.into_expr()), axes, options)
}

/// Sum of squared magnitudes.
pub fn norm_sq<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Real<Elem<E>>>,
) -> Result<XReducer<Plus, XUnary<NormSq, E::Expr>>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    sum(XUnary::new(NormSq, expr.into_expr()), axes, options)
}

/// Euclidean norm.
pub fn norm_l2<E, A>(
    expr: E,
    axes: A,
    options: ReducerOptions<Real<Elem<E>>>,
) -> Result<NormL2<E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    Ok(XUnary::new(Sqrt, norm_sq(expr, axes, options)?))
}

/// Largest magnitude; 0 for empty reductions.
pub fn norm_linf<E, A>(
    expr: E,
    axes: A,
    mut options: ReducerOptions<Real<Elem<E>>>,
) -> Result<XReducer<Maximum, XUnary<NormAbs, E::Expr>>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    if options.initial.is_none() {
        options.initial = Some(<Real<Elem<E>> as num_traits::Zero>::zero());
    }
    reduce(Maximum, XUnary::new(NormAbs, expr.into_expr()), axes, options)
}

/// `(sum |x|^p)^(1/p)`.
pub fn norm_lp<E, A>(
    expr: E,
    p: Real<Elem<E>>,
    axes: A,
    options: ReducerOptions<Real<Elem<E>>>,
) -> Result<NormLp<E::Expr>>
where
    E: IntoExpression,
    A: Into<Axes>,
    Elem<E>: Norm,
{
    let powers = sum(XUnary::new(NormPow(p), expr.into_expr()), axes, options)?;
    Ok(XUnary::new(PowF(p.recip()), powers))
}
