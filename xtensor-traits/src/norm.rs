//! Per-scalar norm kernels.
//!
//! Array norms (`norm_l0` .. `norm_linf`, `norm_lp`) are reductions over a
//! per-element quantity: the magnitude, the squared magnitude, or a nonzero
//! indicator. [`Norm`] gives those quantities for each scalar type and the
//! functor markers below lift them into the expression engine.

use num_complex::Complex;
use num_traits::{Float, One, Zero};

use crate::functor::UnaryFunctor;

/// Scalar magnitudes used by array norms.
///
/// `Real` is the type norms are accumulated in: the type itself for
/// floats, `f64` for integers, and the component type for complex numbers.
pub trait Norm: Copy {
    type Real: Float + Default + Send + Sync;

    /// `|x|`
    fn norm_abs(self) -> Self::Real;

    /// `|x|^2`
    fn norm_sq(self) -> Self::Real;

    /// Whether `x != 0`.
    fn is_nonzero(self) -> bool;
}

macro_rules! impl_norm_float {
    ($($t:ty),*) => {
        $(
            impl Norm for $t {
                type Real = $t;

                #[inline(always)]
                fn norm_abs(self) -> $t {
                    self.abs()
                }

                #[inline(always)]
                fn norm_sq(self) -> $t {
                    self * self
                }

                #[inline(always)]
                fn is_nonzero(self) -> bool {
                    self != 0.0
                }
            }
        )*
    };
}

macro_rules! impl_norm_int {
    ($($t:ty),*) => {
        $(
            impl Norm for $t {
                type Real = f64;

                #[inline(always)]
                fn norm_abs(self) -> f64 {
                    (self as f64).abs()
                }

                #[inline(always)]
                fn norm_sq(self) -> f64 {
                    let v = self as f64;
                    v * v
                }

                #[inline(always)]
                fn is_nonzero(self) -> bool {
                    self != 0
                }
            }
        )*
    };
}

impl_norm_float!(f32, f64);
impl_norm_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T> Norm for Complex<T>
where
    T: Float + Default + Send + Sync,
{
    type Real = T;

    #[inline(always)]
    fn norm_abs(self) -> T {
        self.norm()
    }

    #[inline(always)]
    fn norm_sq(self) -> T {
        self.norm_sqr()
    }

    #[inline(always)]
    fn is_nonzero(self) -> bool {
        !(Zero::is_zero(&self.re) && Zero::is_zero(&self.im))
    }
}

// ---------------------------------------------------------------------------
// Functor markers
// ---------------------------------------------------------------------------

/// Maps `x` to `|x|`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormAbs;

/// Maps `x` to `|x|^2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormSq;

/// Maps `x` to `1` if nonzero, else `0`, in the norm's real type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormNonZero;

/// Maps `x` to `|x|^p`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormPow<R>(pub R);

impl<T: Norm> UnaryFunctor<T> for NormAbs {
    type Output = T::Real;

    #[inline(always)]
    fn apply(&self, a: T) -> T::Real {
        a.norm_abs()
    }
}

impl<T: Norm> UnaryFunctor<T> for NormSq {
    type Output = T::Real;

    #[inline(always)]
    fn apply(&self, a: T) -> T::Real {
        a.norm_sq()
    }
}

impl<T: Norm> UnaryFunctor<T> for NormNonZero {
    type Output = T::Real;

    #[inline(always)]
    fn apply(&self, a: T) -> T::Real {
        if a.is_nonzero() {
            <T::Real as One>::one()
        } else {
            <T::Real as Zero>::zero()
        }
    }
}

impl<T: Norm> UnaryFunctor<T> for NormPow<T::Real> {
    type Output = T::Real;

    #[inline(always)]
    fn apply(&self, a: T) -> T::Real {
        a.norm_abs().powf(self.0)
    }
}
