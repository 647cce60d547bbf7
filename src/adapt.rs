//! Containers over existing memory.
//!
//! `adapt*` wraps storage the caller already has in an [`XContainer`]
//! without copying. The shape argument picks the container kind: a slice
//! or `Vec` of extents gives a dynamic-rank adaptor, `[usize; N]` a
//! static-rank one, and a fixed descriptor such as `Fix2<2, 3>` a fixed
//! adaptor.
//!
//! The storage type decides what happens on resize and drop:
//!
//! | source                         | storage            | resize         |
//! |--------------------------------|--------------------|----------------|
//! | `Vec<T>`, `&mut Vec<T>`        | the vector         | reallocates    |
//! | `&mut [T]`, raw pointer        | [`BorrowedBuffer`] | same size only |
//! | `Vec<T>` handed over, raw box  | [`OwnedBuffer`]    | reallocates    |
//! | owner object or destructor     | [`SharedBuffer`]   | same size only |

use crate::container::XContainer;
use crate::layout::Layout;
use crate::shape::{Dimension, Dyn, Fix1, Fix2, Fix3, Fix4, Fixed, Rank, Shape};
use crate::storage::{BorrowedBuffer, OwnedBuffer, SharedBuffer, Storage};
use crate::strides::compute_size;
use crate::{Result, XtensorError, DEFAULT_LAYOUT};

/// Shape arguments accepted by the adaptors.
pub trait AdaptShape {
    type Dim: Dimension;

    fn into_dim_shape(self) -> Result<<Self::Dim as Dimension>::Shape>;
}

impl AdaptShape for &[usize] {
    type Dim = Dyn;

    fn into_dim_shape(self) -> Result<Shape> {
        Ok(Shape::from_slice(self))
    }
}

impl AdaptShape for Vec<usize> {
    type Dim = Dyn;

    fn into_dim_shape(self) -> Result<Shape> {
        Ok(Shape::from(self))
    }
}

impl AdaptShape for Shape {
    type Dim = Dyn;

    fn into_dim_shape(self) -> Result<Shape> {
        Ok(self)
    }
}

impl<const N: usize> AdaptShape for [usize; N] {
    type Dim = Rank<N>;

    fn into_dim_shape(self) -> Result<[usize; N]> {
        Ok(self)
    }
}

macro_rules! impl_adapt_fixed {
    ($($name:ident<$($d:ident),+>),*) => {
        $(
            impl<$(const $d: usize),+> AdaptShape for $name<$($d),+> {
                type Dim = Fixed<$name<$($d),+>>;

                fn into_dim_shape(self) -> Result<Self> {
                    Ok(self)
                }
            }
        )*
    };
}

impl_adapt_fixed!(Fix1<A>, Fix2<A, B>, Fix3<A, B, C>, Fix4<A, B, C, D>);

/// Adapt `storage` as a dense row-major container of `shape`.
///
/// Fails with [`XtensorError::SizeMismatch`] unless the storage holds
/// exactly as many elements as the shape addresses.
pub fn adapt<S, Sh>(storage: S, shape: Sh) -> Result<XContainer<S, Sh::Dim>>
where
    S: Storage,
    Sh: AdaptShape,
{
    adapt_with_layout(storage, shape, DEFAULT_LAYOUT)
}

/// Adapt `storage` as a dense container of `shape` in `layout`.
pub fn adapt_with_layout<S, Sh>(
    storage: S,
    shape: Sh,
    layout: Layout,
) -> Result<XContainer<S, Sh::Dim>>
where
    S: Storage,
    Sh: AdaptShape,
{
    let shape = shape.into_dim_shape()?;
    let size = compute_size(shape.as_ref());
    if storage.len() != size {
        return Err(XtensorError::SizeMismatch {
            expected: size,
            found: storage.len(),
        });
    }
    Ok(XContainer::from_parts(storage, shape, layout))
}

/// Adapt `storage` with explicit non-negative strides.
pub fn adapt_strided<S, Sh>(
    storage: S,
    shape: Sh,
    strides: &[isize],
) -> Result<XContainer<S, Sh::Dim>>
where
    S: Storage,
    Sh: AdaptShape,
{
    XContainer::from_parts_strided(storage, shape.into_dim_shape()?, strides)
}

/// Adapt a mutable slice without taking ownership.
pub fn adapt_slice<T, Sh>(data: &mut [T], shape: Sh) -> Result<XContainer<BorrowedBuffer<'_, T>, Sh::Dim>>
where
    T: Clone + Default,
    Sh: AdaptShape,
{
    adapt(BorrowedBuffer::new(data), shape)
}

/// Adapt a vector, taking ownership of its memory.
pub fn adapt_vec<T, Sh>(data: Vec<T>, shape: Sh) -> Result<XContainer<OwnedBuffer<T>, Sh::Dim>>
where
    T: Clone + Default,
    Sh: AdaptShape,
{
    adapt(OwnedBuffer::from_vec(data), shape)
}

/// Adapt `len` elements at `ptr` without taking ownership.
///
/// # Safety
/// `ptr` must be valid for reads and writes of `len` elements for `'a` and
/// not accessed through any other handle meanwhile.
pub unsafe fn adapt_ptr<'a, T, Sh>(
    ptr: *mut T,
    len: usize,
    shape: Sh,
) -> Result<XContainer<BorrowedBuffer<'a, T>, Sh::Dim>>
where
    T: Clone + Default,
    Sh: AdaptShape,
{
    adapt(BorrowedBuffer::from_raw_parts(ptr, len), shape)
}

/// Adapt `len` elements at `ptr`, taking over their deallocation.
///
/// # Safety
/// `ptr` and `len` must describe a `Box<[T]>` released with
/// `Box::into_raw` that nothing else frees.
pub unsafe fn adapt_acquire<T, Sh>(
    ptr: *mut T,
    len: usize,
    shape: Sh,
) -> Result<XContainer<OwnedBuffer<T>, Sh::Dim>>
where
    T: Clone + Default,
    Sh: AdaptShape,
{
    adapt(OwnedBuffer::from_raw_parts(ptr, len), shape)
}

/// Adapt the memory of `owner`, which the container keeps alive.
pub fn adapt_owner<T, O, Sh>(owner: O, shape: Sh) -> Result<XContainer<SharedBuffer<T>, Sh::Dim>>
where
    T: Clone + Default,
    O: AsMut<[T]> + 'static,
    Sh: AdaptShape,
{
    adapt(SharedBuffer::from_owner(owner), shape)
}

/// Adapt `len` elements at `ptr` whose lifetime is tied to `owner`, for
/// instance a clone of the `Rc` or `Arc` holding them.
///
/// # Safety
/// `ptr` must stay valid for reads and writes of `len` elements while
/// `owner` is alive, and no other handle may access the memory meanwhile.
pub unsafe fn adapt_shared<T, O, Sh>(
    ptr: *mut T,
    len: usize,
    shape: Sh,
    owner: O,
) -> Result<XContainer<SharedBuffer<T>, Sh::Dim>>
where
    T: Clone + Default,
    O: 'static,
    Sh: AdaptShape,
{
    adapt(SharedBuffer::from_raw_parts_with_owner(ptr, len, owner), shape)
}

/// Adapt `len` elements at `ptr`, running `destructor` when the container
/// is dropped.
///
/// # Safety
/// `ptr` must stay valid for reads and writes of `len` elements until
/// `destructor` runs, and no other handle may access the memory meanwhile.
pub unsafe fn adapt_with_destructor<T, F, Sh>(
    ptr: *mut T,
    len: usize,
    shape: Sh,
    destructor: F,
) -> Result<XContainer<SharedBuffer<T>, Sh::Dim>>
where
    T: Clone + Default,
    F: FnOnce() + 'static,
    Sh: AdaptShape,
{
    adapt(SharedBuffer::with_destructor(ptr, len, destructor), shape)
}
