//! Common-type promotion of mixed operands.
//!
//! Arithmetic, comparison and extrema functors convert both operands to
//! `<A as Promote<B>>::Output` before combining them, so `i32 + f64`
//! yields `f64`. Equal types promote to themselves. Mixed primitive pairs
//! follow the usual arithmetic conversions of C-family languages:
//!
//! - a float wins over any integer, `f64` over `f32`
//! - integers narrower than 32 bits combine as `i32`
//! - otherwise the wider type wins, and at equal width the unsigned one
//!
//! A real scalar mixed with a complex number of the same precision
//! promotes to the complex type.

use num_complex::Complex;
use num_traits::AsPrimitive;

/// Common type of `Self` and `B`.
pub trait Promote<B>: Copy {
    type Output: Copy;

    /// Both operands converted to the common type.
    fn promote(self, b: B) -> (Self::Output, Self::Output);
}

impl<T: Copy> Promote<T> for T {
    type Output = T;

    #[inline(always)]
    fn promote(self, b: T) -> (T, T) {
        (self, b)
    }
}

macro_rules! impl_promote {
    ($($a:ty, $b:ty => $out:ty;)*) => {
        $(
            impl Promote<$b> for $a {
                type Output = $out;

                #[inline(always)]
                fn promote(self, b: $b) -> ($out, $out) {
                    (<$a as AsPrimitive<$out>>::as_(self), <$b as AsPrimitive<$out>>::as_(b))
                }
            }

            impl Promote<$a> for $b {
                type Output = $out;

                #[inline(always)]
                fn promote(self, b: $a) -> ($out, $out) {
                    (<$b as AsPrimitive<$out>>::as_(self), <$a as AsPrimitive<$out>>::as_(b))
                }
            }
        )*
    };
}

impl_promote! {
    i8, i16 => i32;
    i8, u8 => i32;
    i8, u16 => i32;
    i16, u8 => i32;
    i16, u16 => i32;
    u8, u16 => i32;

    i8, i32 => i32;
    i16, i32 => i32;
    u8, i32 => i32;
    u16, i32 => i32;

    i8, u32 => u32;
    i16, u32 => u32;
    u8, u32 => u32;
    u16, u32 => u32;
    i32, u32 => u32;

    i8, i64 => i64;
    i16, i64 => i64;
    u8, i64 => i64;
    u16, i64 => i64;
    i32, i64 => i64;
    u32, i64 => i64;

    i8, u64 => u64;
    i16, u64 => u64;
    u8, u64 => u64;
    u16, u64 => u64;
    i32, u64 => u64;
    u32, u64 => u64;
    i64, u64 => u64;

    i8, f32 => f32;
    i16, f32 => f32;
    i32, f32 => f32;
    i64, f32 => f32;
    u8, f32 => f32;
    u16, f32 => f32;
    u32, f32 => f32;
    u64, f32 => f32;

    i8, f64 => f64;
    i16, f64 => f64;
    i32, f64 => f64;
    i64, f64 => f64;
    u8, f64 => f64;
    u16, f64 => f64;
    u32, f64 => f64;
    u64, f64 => f64;
    f32, f64 => f64;
}

macro_rules! impl_promote_complex {
    ($($t:ty),*) => {
        $(
            impl Promote<$t> for Complex<$t> {
                type Output = Complex<$t>;

                #[inline(always)]
                fn promote(self, b: $t) -> (Complex<$t>, Complex<$t>) {
                    (self, Complex::from(b))
                }
            }

            impl Promote<Complex<$t>> for $t {
                type Output = Complex<$t>;

                #[inline(always)]
                fn promote(self, b: Complex<$t>) -> (Complex<$t>, Complex<$t>) {
                    (Complex::from(self), b)
                }
            }
        )*
    };
}

impl_promote_complex!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn common<A: Promote<B>, B>(a: A, b: B) -> (A::Output, A::Output) {
        a.promote(b)
    }

    #[test]
    fn test_same_type_is_identity() {
        assert_eq!(common(3u8, 4u8), (3u8, 4u8));
        assert_eq!(common(true, false), (true, false));
    }

    #[test]
    fn test_float_wins() {
        assert_eq!(common(2i32, 0.5f64), (2.0f64, 0.5));
        assert_eq!(common(1.5f32, 7u64), (1.5f32, 7.0));
        assert_eq!(common(0.25f32, 1.0f64), (0.25f64, 1.0));
    }

    #[test]
    fn test_integer_ranks() {
        assert_eq!(common(200u8, -1i8), (200i32, -1));
        assert_eq!(common(3i32, 4u32), (3u32, 4));
        assert_eq!(common(5u32, -6i64), (5i64, -6));
        assert_eq!(common(-1i64, 1u64), (u64::MAX, 1));
    }

    #[test]
    fn test_complex() {
        let (a, b) = common(2.0f64, Complex::new(1.0, -1.0));
        assert_eq!(a, Complex::new(2.0, 0.0));
        assert_eq!(b, Complex::new(1.0, -1.0));
    }
}
