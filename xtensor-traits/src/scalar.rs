//! Scalar type bounds for xtensor containers and expressions.

use num_complex::Complex;
use num_traits::{One, Zero};

/// Element types with additive and multiplicative identities.
///
/// Builders such as `zeros`, `ones` and `eye` fill containers from these
/// identities. Any semiring-like type qualifies once it implements
/// `Zero`, `One` and [`MaybeNan`]; the last one only needs an empty impl.
pub trait ScalarBase: Copy + Default + PartialEq + Zero + One + MaybeNan {}

impl<T> ScalarBase for T where T: Copy + Default + PartialEq + Zero + One + MaybeNan {}

/// Types that may hold a NaN value.
///
/// Integer types never do. Floating point and complex types report NaN so
/// that `nansum`, `nancumsum` and friends can replace those operands with
/// the functor's identity element.
pub trait MaybeNan: Copy {
    #[inline(always)]
    fn has_nan(&self) -> bool {
        false
    }
}

macro_rules! impl_maybe_nan_int {
    ($($t:ty),*) => {
        $(impl MaybeNan for $t {})*
    };
}

impl_maybe_nan_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool);

impl MaybeNan for f32 {
    #[inline(always)]
    fn has_nan(&self) -> bool {
        self.is_nan()
    }
}

impl MaybeNan for f64 {
    #[inline(always)]
    fn has_nan(&self) -> bool {
        self.is_nan()
    }
}

impl<T: MaybeNan> MaybeNan for Complex<T> {
    #[inline(always)]
    fn has_nan(&self) -> bool {
        self.re.has_nan() || self.im.has_nan()
    }
}
