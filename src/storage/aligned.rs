//! Inline fixed-size storage for fixed-shape containers.

use std::ops::{Deref, DerefMut};

use super::{not_resizable, OwnedStorage, Storage};
use crate::{Result, XtensorError};

/// `N` elements stored inline, aligned to [`crate::STORAGE_ALIGNMENT`] bytes.
///
/// The length is part of the type, so `resize` only accepts `N`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct AlignedArray<T, const N: usize> {
    data: [T; N],
}

impl<T, const N: usize> AlignedArray<T, N> {
    pub const fn new(data: [T; N]) -> Self {
        Self { data }
    }

    pub fn into_inner(self) -> [T; N] {
        self.data
    }
}

impl<T: Default, const N: usize> Default for AlignedArray<T, N> {
    fn default() -> Self {
        Self {
            data: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T: std::fmt::Debug, const N: usize> std::fmt::Debug for AlignedArray<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T, const N: usize> Deref for AlignedArray<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T, const N: usize> DerefMut for AlignedArray<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Clone + Default, const N: usize> Storage for AlignedArray<T, N> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        N
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        not_resizable(N, len)
    }
}

impl<T: Clone + Default, const N: usize> OwnedStorage for AlignedArray<T, N> {
    fn from_elem(len: usize, value: T) -> Result<Self> {
        if len != N {
            return Err(XtensorError::SizeMismatch {
                expected: N,
                found: len,
            });
        }
        Ok(Self {
            data: std::array::from_fn(|_| value.clone()),
        })
    }

    fn from_vec(data: Vec<T>) -> Result<Self> {
        let found = data.len();
        let data: [T; N] = data.try_into().map_err(|_| XtensorError::SizeMismatch {
            expected: N,
            found,
        })?;
        Ok(Self { data })
    }
}
