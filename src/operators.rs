//! Arithmetic and logical operators building lazy expressions.
//!
//! `a + b` never computes anything: it wraps both operands in an
//! [`XBinary`] node. Operands are borrowed when written `&a` and moved
//! otherwise, so `&a + &b` leaves both containers usable.
//!
//! Primitive numbers are accepted on either side. Mixed element types are
//! promoted to their common type, so an `i32` array plus an `f64` array is
//! an `f64` expression.

use num_complex::Complex;
use xtensor_traits::{
    BinaryFunctor, BitAnd as BitAndFn, BitOr as BitOrFn, Divides, LogicalNot, Minus, Multiplies,
    Negate, Plus, UnaryFunctor,
};

use crate::container::XContainer;
use crate::expression::{Expression, IntoExpression, Scalar};
use crate::function::{XBinary, XBroadcast, XUnary};
use crate::reducer::XReducer;
use crate::shape::Dimension;
use crate::storage::Storage;
use crate::view::StridedView;

macro_rules! impl_binary_op {
    ([$($gen:tt)*] $head:ty, $trait:ident, $method:ident, $functor:ident) => {
        impl<$($gen)*, Rhs> std::ops::$trait<Rhs> for $head
        where
            Rhs: IntoExpression,
            Self: Expression,
            $functor: BinaryFunctor<<Self as Expression>::Elem, <Rhs::Expr as Expression>::Elem>,
        {
            type Output = XBinary<$functor, Self, Rhs::Expr>;

            #[inline]
            fn $method(self, rhs: Rhs) -> Self::Output {
                XBinary::new($functor, self, rhs.into_expr())
            }
        }
    };
}

macro_rules! impl_unary_op {
    ([$($gen:tt)*] $head:ty, $trait:ident, $method:ident, $functor:ident) => {
        impl<$($gen)*> std::ops::$trait for $head
        where
            Self: Expression,
            $functor: UnaryFunctor<<Self as Expression>::Elem>,
        {
            type Output = XUnary<$functor, Self>;

            #[inline]
            fn $method(self) -> Self::Output {
                XUnary::new($functor, self)
            }
        }
    };
}

macro_rules! impl_scalar_lhs_op {
    ([$($gen:tt)*] $head:ty, $scalar:ty, $trait:ident, $method:ident, $functor:ident) => {
        impl<$($gen)*> std::ops::$trait<$head> for $scalar
        where
            $head: Expression,
            $functor: BinaryFunctor<$scalar, <$head as Expression>::Elem>,
        {
            type Output = XBinary<$functor, Scalar<$scalar>, $head>;

            #[inline]
            fn $method(self, rhs: $head) -> Self::Output {
                XBinary::new($functor, Scalar(self), rhs)
            }
        }
    };
}

macro_rules! impl_scalar_lhs {
    ($gen:tt $head:ty; $($scalar:ty),*) => {
        $(
            impl_scalar_lhs_op!($gen $head, $scalar, Add, add, Plus);
            impl_scalar_lhs_op!($gen $head, $scalar, Sub, sub, Minus);
            impl_scalar_lhs_op!($gen $head, $scalar, Mul, mul, Multiplies);
            impl_scalar_lhs_op!($gen $head, $scalar, Div, div, Divides);
        )*
    };
}

macro_rules! impl_expression_ops {
    ($gen:tt $head:ty) => {
        impl_binary_op!($gen $head, Add, add, Plus);
        impl_binary_op!($gen $head, Sub, sub, Minus);
        impl_binary_op!($gen $head, Mul, mul, Multiplies);
        impl_binary_op!($gen $head, Div, div, Divides);
        impl_binary_op!($gen $head, BitAnd, bitand, BitAndFn);
        impl_binary_op!($gen $head, BitOr, bitor, BitOrFn);
        impl_unary_op!($gen $head, Neg, neg, Negate);
        impl_unary_op!($gen $head, Not, not, LogicalNot);
        impl_scalar_lhs!($gen $head;
            f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
            Complex<f32>, Complex<f64>
        );
    };
}

impl_expression_ops!(['a, S: Storage, D: Dimension] &'a XContainer<S, D>);
impl_expression_ops!([S: Storage, D: Dimension] XContainer<S, D>);
impl_expression_ops!(['a, T: Copy] StridedView<'a, T>);
impl_expression_ops!(['a, T: Copy] &'a StridedView<'a, T>);
impl_expression_ops!([F, E] XUnary<F, E>);
impl_expression_ops!(['a, F, E] &'a XUnary<F, E>);
impl_expression_ops!([F, L, R] XBinary<F, L, R>);
impl_expression_ops!(['a, F, L, R] &'a XBinary<F, L, R>);
impl_expression_ops!([E] XBroadcast<E>);
impl_expression_ops!([F, E: Expression] XReducer<F, E>);
impl_expression_ops!(['a, F, E: Expression] &'a XReducer<F, E>);
impl_expression_ops!([T] Scalar<T>);

#[cfg(test)]
mod tests {
    use crate::{eval, Expression, XArray};

    fn array(shape: &[usize], data: Vec<f64>) -> XArray<f64> {
        XArray::from_shape_vec(shape, data).unwrap()
    }

    #[test]
    fn test_add_containers_by_reference() {
        let a = array(&[2], vec![1.0, 2.0]);
        let b = array(&[2], vec![10.0, 20.0]);
        let c = eval(&a + &b).unwrap();
        assert_eq!(c.data(), &[11.0, 22.0]);
        // operands are still usable
        assert_eq!(a.data(), &[1.0, 2.0]);
    }

    #[test]
    fn test_operator_chain() {
        let a = array(&[3], vec![1.0, 2.0, 3.0]);
        let b = array(&[3], vec![4.0, 5.0, 6.0]);
        let e = (&a + &b) * 2.0 - &a / 1.0;
        assert_eq!(eval(e).unwrap().data(), &[9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_scalar_on_the_left() {
        let a = array(&[3], vec![1.0, 2.0, 4.0]);
        assert_eq!(eval(1.0 + &a).unwrap().data(), &[2.0, 3.0, 5.0]);
        assert_eq!(eval(1.0 - &a).unwrap().data(), &[0.0, -1.0, -3.0]);
        assert_eq!(eval(2.0 * &a).unwrap().data(), &[2.0, 4.0, 8.0]);
        assert_eq!(eval(4.0 / &a).unwrap().data(), &[4.0, 2.0, 1.0]);
    }

    #[test]
    fn test_unary_operators() {
        let a = array(&[2], vec![1.0, -2.0]);
        assert_eq!(eval(-&a).unwrap().data(), &[-1.0, 2.0]);
        let p = XArray::from_shape_vec(&[2], vec![true, false]).unwrap();
        assert_eq!(eval(!&p).unwrap().data(), &[false, true]);
    }

    #[test]
    fn test_bitwise_operators_on_booleans() {
        let p = XArray::from_shape_vec(&[3], vec![true, false, true]).unwrap();
        let q = XArray::from_shape_vec(&[3], vec![true, true, false]).unwrap();
        assert_eq!(eval(&p & &q).unwrap().data(), &[true, false, false]);
        assert_eq!(eval(&p | &q).unwrap().data(), &[true, true, true]);
    }

    #[test]
    fn test_broadcasting_operator() {
        let col = array(&[3, 1], vec![0.0, 10.0, 20.0]);
        let row = array(&[1, 4], vec![1.0, 2.0, 3.0, 4.0]);
        let e = &col + &row;
        assert_eq!(e.shape().unwrap(), [3, 4]);
        let out = eval(e).unwrap();
        assert_eq!(out[[2, 3]], 24.0);
        assert_eq!(out[[1, 0]], 11.0);
    }

    #[test]
    fn test_owned_operands() {
        let a = array(&[2], vec![1.0, 2.0]);
        let b = array(&[2], vec![3.0, 4.0]);
        let e = a + b;
        assert_eq!(eval(e).unwrap().data(), &[4.0, 6.0]);
    }

    #[test]
    fn test_mixed_element_types_promote() {
        let counts = XArray::from_shape_vec(&[3], vec![1i32, 2, 3]).unwrap();
        let weights = array(&[3], vec![0.5, 0.25, 2.0]);
        let e = &counts * &weights;
        let out: XArray<f64> = eval(e).unwrap();
        assert_eq!(out.data(), &[0.5, 0.5, 6.0]);

        let bytes = XArray::from_shape_vec(&[2], vec![250u8, 3]).unwrap();
        let widened: XArray<i32> = eval(&bytes + 10i8).unwrap();
        assert_eq!(widened.data(), &[260, 13]);
        let halves: XArray<f64> = eval(&counts / 2.0).unwrap();
        assert_eq!(halves.data(), &[0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_integer_elements() {
        let a = XArray::from_shape_vec(&[3], vec![1i64, 2, 3]).unwrap();
        assert_eq!(eval(10i64 - &a).unwrap().data(), &[9, 8, 7]);
        assert_eq!(eval(&a * 3i64).unwrap().data(), &[3, 6, 9]);
    }
}
