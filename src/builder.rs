//! Array builders: constant fills, identity matrices and numeric ranges.

use std::ops::{Add, Mul};

use num_traits::{Float, NumCast, ToPrimitive};
use tracing::trace;
use xtensor_traits::ScalarBase;

use crate::container::XArray;
use crate::{Result, XtensorError};

/// Array of `shape` filled with zeros.
pub fn zeros<T: ScalarBase>(shape: &[usize]) -> Result<XArray<T>> {
    XArray::from_shape_value(shape, T::zero())
}

/// Array of `shape` filled with ones.
pub fn ones<T: ScalarBase>(shape: &[usize]) -> Result<XArray<T>> {
    XArray::from_shape_value(shape, T::one())
}

/// `n x n` identity matrix.
pub fn eye<T: ScalarBase>(n: usize) -> Result<XArray<T>> {
    eye_k(n, n, 0)
}

/// `rows x cols` matrix with ones on diagonal `k` and zeros elsewhere.
///
/// `k > 0` selects a diagonal above the main one, `k < 0` one below it.
pub fn eye_k<T: ScalarBase>(rows: usize, cols: usize, k: isize) -> Result<XArray<T>> {
    let mut out = zeros::<T>(&[rows, cols])?;
    let (row0, col0) = if k >= 0 {
        (0, k.unsigned_abs())
    } else {
        (k.unsigned_abs(), 0)
    };
    for (r, c) in (row0..rows).zip(col0..cols) {
        out[[r, c]] = T::one();
    }
    Ok(out)
}

fn to_f64<T: ToPrimitive>(value: T) -> Result<f64> {
    value.to_f64().ok_or(XtensorError::ScalarConversion)
}

/// `start, start + step, ...` up to but excluding `stop`.
///
/// The length is `ceil((stop - start) / step)`, or zero when `step`
/// points away from `stop`.
///
/// ```rust
/// let a = xtensor::arange(1, 10, 3).unwrap();
/// assert_eq!(a.data(), &[1, 4, 7]);
/// let b = xtensor::arange(1.0, 0.0, -0.25).unwrap();
/// assert_eq!(b.data(), &[1.0, 0.75, 0.5, 0.25]);
/// ```
pub fn arange<T>(start: T, stop: T, step: T) -> Result<XArray<T>>
where
    T: Copy + Default + NumCast + Add<Output = T> + Mul<Output = T>,
{
    let step_f = to_f64(step)?;
    if step_f == 0.0 {
        return Err(XtensorError::ZeroStep);
    }
    let span = ((to_f64(stop)? - to_f64(start)?) / step_f).ceil();
    let len = if span > 0.0 { span as usize } else { 0 };
    trace!(len, "arange");
    let data = (0..len)
        .map(|i| {
            let i = <T as NumCast>::from(i).ok_or(XtensorError::ScalarConversion)?;
            Ok(start + i * step)
        })
        .collect::<Result<Vec<T>>>()?;
    XArray::from_shape_vec(&[len], data)
}

/// `num` evenly spaced samples from `start` to `stop`.
///
/// With `endpoint` the last sample is `stop` itself, otherwise `stop` is
/// excluded and the spacing is `(stop - start) / num`.
pub fn linspace<T: Float + Default>(start: T, stop: T, num: usize, endpoint: bool) -> Result<XArray<T>> {
    let intervals = if endpoint { num.saturating_sub(1) } else { num };
    let step = if intervals == 0 {
        T::zero()
    } else {
        let n = <T as NumCast>::from(intervals).ok_or(XtensorError::ScalarConversion)?;
        (stop - start) / n
    };
    let mut data = (0..num)
        .map(|i| {
            let i = <T as NumCast>::from(i).ok_or(XtensorError::ScalarConversion)?;
            Ok(start + i * step)
        })
        .collect::<Result<Vec<T>>>()?;
    if endpoint && num > 1 {
        data[num - 1] = stop;
    }
    XArray::from_shape_vec(&[num], data)
}
