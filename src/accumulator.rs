//! Running accumulations along one axis.
//!
//! Unlike reducers, accumulators keep the shape of their input: element `k`
//! along the axis holds the combination of elements `0..=k`. The result is
//! always evaluated into a new row-major [`XArray`].

use tracing::debug;
use xtensor_traits::{BinaryFunctor, HasIdentity, MaybeNan, Multiplies, NanSkip, Plus};

use crate::container::XArray;
use crate::expression::{Expression, IntoExpression};
use crate::strides::compute_size;
use crate::{Result, XtensorError};

type Elem<E> = <<E as IntoExpression>::Expr as Expression>::Elem;

/// Running combination of `expr` by `functor` along `axis`.
///
/// With `axis == None` the expression is flattened in row-major order and
/// the result is 1-d. An axis outside the expression's rank fails with
/// [`XtensorError::AccumulatorAxis`].
pub fn accumulate<F, E>(functor: F, expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default,
    F: BinaryFunctor<Elem<E>, Elem<E>, Output = Elem<E>>,
{
    accumulate_seeded(functor, expr, axis, |v| v)
}

/// Accumulation whose first element along the axis is `seed(value)`.
fn accumulate_seeded<F, E, S>(functor: F, expr: E, axis: Option<usize>, seed: S) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default,
    F: BinaryFunctor<Elem<E>, Elem<E>, Output = Elem<E>>,
    S: Fn(Elem<E>) -> Elem<E>,
{
    let expr = expr.into_expr();
    let mut out = XArray::from_expr(&expr)?;
    let axis = match axis {
        Some(axis) => {
            if axis >= out.dimension() {
                return Err(XtensorError::AccumulatorAxis {
                    axis,
                    rank: out.dimension(),
                });
            }
            axis
        }
        None => {
            let size = out.size();
            out.reshape(&[size])?;
            0
        }
    };

    let shape = out.shape().to_vec();
    let extent = shape[axis];
    let inner = compute_size(&shape[axis + 1..]);
    let outer = compute_size(&shape[..axis]);
    debug!(shape = ?shape, axis, "accumulating");
    if extent == 0 {
        return Ok(out);
    }

    let data = out.data_mut();
    for o in 0..outer {
        let block = o * extent * inner;
        for i in 0..inner {
            let first = block + i;
            data[first] = seed(data[first]);
            for k in 1..extent {
                let pos = first + k * inner;
                data[pos] = functor.apply(data[pos - inner], data[pos]);
            }
        }
    }
    Ok(out)
}

/// NaN-skipping accumulation: NaN operands count as the identity.
fn nan_accumulate<F, E>(functor: F, expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default + MaybeNan,
    F: BinaryFunctor<Elem<E>, Elem<E>, Output = Elem<E>> + HasIdentity<Elem<E>>,
{
    let identity: Elem<E> = functor.identity();
    let seed = move |v: Elem<E>| if v.has_nan() { identity } else { v };
    accumulate_seeded(NanSkip(functor), expr, axis, seed)
}

/// Cumulative sum.
pub fn cumsum<E>(expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default + std::ops::Add<Output = Elem<E>>,
{
    accumulate(Plus, expr, axis)
}

/// Cumulative product.
pub fn cumprod<E>(expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default + std::ops::Mul<Output = Elem<E>>,
{
    accumulate(Multiplies, expr, axis)
}

/// Cumulative sum treating NaN as 0.
pub fn nancumsum<E>(expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default + MaybeNan + std::ops::Add<Output = Elem<E>>,
    Plus: HasIdentity<Elem<E>>,
{
    nan_accumulate(Plus, expr, axis)
}

/// Cumulative product treating NaN as 1.
pub fn nancumprod<E>(expr: E, axis: Option<usize>) -> Result<XArray<Elem<E>>>
where
    E: IntoExpression,
    Elem<E>: Default + MaybeNan + std::ops::Mul<Output = Elem<E>>,
    Multiplies: HasIdentity<Elem<E>>,
{
    nan_accumulate(Multiplies, expr, axis)
}
