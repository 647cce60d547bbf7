//! Evaluation of expressions into containers.
//!
//! Assignment picks one of two loops:
//!
//! - linear: every leaf shares the destination's shape and strides, so the
//!   `i`-th storage slot of the destination reads the `i`-th slot of each
//!   leaf
//! - stepper: the destination multi-index is advanced like an odometer and
//!   every leaf's stepper follows it, absorbing broadcast axes
//!
//! Shapes are validated before the first write.

use tracing::debug;
use xtensor_traits::BinaryFunctor;

use crate::container::XContainer;
use crate::expression::{Expression, Stepper};
use crate::shape::{Dimension, Shape};
use crate::storage::Storage;
use crate::strides::compute_size;
use crate::{Result, XtensorError};

/// Whether `expr` fits the destination shape exactly, and whether it may be
/// read linearly.
fn check_fit<E: Expression>(dest_shape: &[usize], dest_strides: &[isize], expr: &E) -> Result<bool> {
    let mut shape = Shape::from_slice(dest_shape);
    let trivial = expr.broadcast_shape(&mut shape)?;
    if shape.as_slice() != dest_shape {
        return Err(XtensorError::BroadcastMismatch {
            lhs: shape.to_vec(),
            rhs: dest_shape.to_vec(),
        });
    }
    Ok(trivial && expr.is_trivial_broadcast(dest_strides))
}

/// Mutable strided memory written by an assignment: a container's storage
/// or the window of a mutable view.
pub(crate) struct StridedDest<'d, T> {
    pub(crate) data: &'d mut [T],
    pub(crate) offset: isize,
    pub(crate) shape: &'d [usize],
    pub(crate) strides: &'d [isize],
    pub(crate) backstrides: &'d [isize],
}

/// Walk `dest` in row-major order with `expr`'s stepper following along,
/// calling `write` on every destination slot.
fn stepper_walk<T, E, W>(dest: StridedDest<'_, T>, expr: &E, mut write: W)
where
    E: Expression,
    W: FnMut(&mut T, E::Elem),
{
    let size = compute_size(dest.shape);
    let rank = dest.shape.len();
    let mut stepper = expr.stepper(rank);
    let mut index = Shape::from_elem(0, rank);
    let mut pos = dest.offset;
    for _ in 0..size {
        write(&mut dest.data[pos as usize], stepper.value());
        for d in (0..rank).rev() {
            index[d] += 1;
            if index[d] < dest.shape[d] {
                stepper.step(d);
                pos += dest.strides[d];
                break;
            }
            index[d] = 0;
            stepper.reset(d);
            pos -= dest.backstrides[d];
        }
    }
}

/// Broadcast `expr` into the fixed shape of `dest` and update every slot
/// with `write(slot, value)`. Nothing is written when the shapes disagree.
pub(crate) fn update_strided<T, E, W>(dest: StridedDest<'_, T>, expr: &E, write: W) -> Result<()>
where
    E: Expression,
    W: FnMut(&mut T, E::Elem),
{
    check_fit(dest.shape, dest.strides, expr)?;
    debug!(shape = ?dest.shape, offset = dest.offset, "assigning through strided destination");
    stepper_walk(dest, expr, write);
    Ok(())
}

/// Update `dest` from `expr`, through the linear loop when every leaf
/// shares the destination's contiguous strides.
fn update_container<S, D, E, W>(dest: &mut XContainer<S, D>, expr: &E, mut write: W) -> Result<()>
where
    S: Storage,
    D: Dimension,
    E: Expression,
    W: FnMut(&mut S::Elem, E::Elem),
{
    let linear = check_fit(dest.shape(), dest.strides(), expr)? && dest.is_contiguous();
    debug!(shape = ?dest.shape(), linear, "assigning expression");
    if dest.size() == 0 {
        return Ok(());
    }
    let (data, shape, strides, backstrides) = dest.raw_parts_mut();
    if linear {
        for (i, slot) in data.iter_mut().enumerate() {
            write(slot, expr.linear(i));
        }
        return Ok(());
    }
    let dest = StridedDest {
        data,
        offset: 0,
        shape,
        strides,
        backstrides,
    };
    stepper_walk(dest, expr, write);
    Ok(())
}

/// Evaluate `expr` into `dest`, whose shape must already be the
/// expression's broadcast shape.
pub(crate) fn assign_data<S, D, E>(dest: &mut XContainer<S, D>, expr: &E) -> Result<()>
where
    S: Storage,
    S::Elem: Copy,
    D: Dimension,
    E: Expression<Elem = S::Elem>,
{
    update_container(dest, expr, |slot, value| *slot = value)
}

/// `dest[i] = f(dest[i], expr[i])` with `expr` broadcast into `dest`.
pub(crate) fn compound_assign<S, D, F, E>(dest: &mut XContainer<S, D>, functor: F, expr: &E) -> Result<()>
where
    S: Storage,
    S::Elem: Copy,
    D: Dimension,
    E: Expression,
    F: BinaryFunctor<S::Elem, E::Elem, Output = S::Elem>,
{
    update_container(dest, expr, |slot, value| *slot = functor.apply(*slot, value))
}

/// Parallel counterpart of [`XContainer::assign`].
///
/// The outermost axis is split into slabs evaluated on the rayon pool.
/// Small or non row-major destinations fall back to the sequential loop.
#[cfg(feature = "parallel")]
pub fn par_assign<S, D, E>(dest: &mut XContainer<S, D>, expr: E) -> Result<()>
where
    S: Storage,
    S::Elem: Copy + Send,
    D: Dimension,
    E: crate::IntoExpression,
    E::Expr: Expression<Elem = S::Elem> + Sync,
{
    use rayon::prelude::*;

    use crate::layout::Layout;
    use crate::strides::next_index;

    let expr = expr.into_expr();
    let shape = expr.shape()?;
    dest.resize(&shape)?;
    let size = compute_size(&shape);
    if size < crate::PAR_THRESHOLD
        || shape.is_empty()
        || dest.layout() != Layout::RowMajor
        || !dest.is_contiguous()
    {
        return assign_data(dest, &expr);
    }

    let slab = size / shape[0];
    debug!(
        slabs = shape[0],
        slab,
        threads = rayon::current_num_threads(),
        "parallel assignment"
    );
    let inner = &shape[1..];
    dest.data_mut()
        .par_chunks_mut(slab)
        .enumerate()
        .for_each(|(outer, chunk)| {
            let mut index = Shape::from_elem(0, shape.len());
            index[0] = outer;
            for slot in chunk.iter_mut() {
                *slot = expr.element(&index);
                next_index(&mut index[1..], inner);
            }
        });
    Ok(())
}
