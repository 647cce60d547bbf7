//! Contiguous storage backends.
//!
//! A container only needs contiguous memory with a length, element access
//! and a resize hook; [`Storage`] captures exactly that. The backends differ
//! in who owns the memory:
//!
//! - [`UVector`]: exclusive heap allocation, resize reallocates
//! - [`SVector`]: inline small buffer that spills to the heap
//! - [`AlignedArray`]: inline fixed-size array, over-aligned
//! - [`BorrowedBuffer`]: external memory the adaptor never frees
//! - [`OwnedBuffer`]: external memory the adaptor acquired and frees
//! - [`SharedBuffer`]: external memory whose lifetime is governed by a
//!   captured owner or destructor
//!
//! `Vec<T>` and `&mut Vec<T>` are storages too, so standard vectors can be
//! adapted by value or by reference.

mod aligned;
mod buffer;
mod svector;
mod uvector;

pub use aligned::AlignedArray;
pub use buffer::{BorrowedBuffer, OwnedBuffer, SharedBuffer};
pub use svector::SVector;
pub use uvector::UVector;

use crate::{Result, XtensorError};

/// Contiguous memory usable as the backing store of a container.
pub trait Storage {
    type Elem;

    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_slice(&self) -> &[Self::Elem];

    fn as_mut_slice(&mut self) -> &mut [Self::Elem];

    /// Change the number of elements.
    ///
    /// Backends whose extent is fixed by their source fail with
    /// [`XtensorError::NotResizable`] unless `len` equals the current
    /// length, and leave themselves untouched on failure.
    fn resize(&mut self, len: usize) -> Result<()>;
}

/// Storage that can allocate its own memory.
pub trait OwnedStorage: Storage + Sized {
    /// `len` copies of `value`.
    fn from_elem(len: usize, value: Self::Elem) -> Result<Self>;

    /// Take ownership of the elements of `data`.
    fn from_vec(data: Vec<Self::Elem>) -> Result<Self>;
}

pub(crate) fn not_resizable(len: usize, requested: usize) -> Result<()> {
    if len == requested {
        Ok(())
    } else {
        Err(XtensorError::NotResizable { len, requested })
    }
}

// ============================================================================
// Standard vectors
// ============================================================================

impl<T: Clone + Default> Storage for Vec<T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        Vec::resize(self, len, T::default());
        Ok(())
    }
}

impl<T: Clone + Default> OwnedStorage for Vec<T> {
    fn from_elem(len: usize, value: T) -> Result<Self> {
        Ok(vec![value; len])
    }

    fn from_vec(data: Vec<T>) -> Result<Self> {
        Ok(data)
    }
}

/// A container adapting a vector by reference resizes the vector itself.
impl<T: Clone + Default> Storage for &mut Vec<T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        Vec::resize(self, len, T::default());
        Ok(())
    }
}
