//! Exclusively owned heap storage.

use std::ops::{Deref, DerefMut};

use super::{OwnedStorage, Storage};
use crate::Result;

/// A fixed-length heap array.
///
/// Unlike `Vec`, `UVector` keeps no spare capacity and `resize` does not
/// preserve contents: changing the length reallocates and default-fills
/// the new block. Containers always overwrite storage after a resize, so
/// copying the old elements would be wasted work.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct UVector<T> {
    data: Box<[T]>,
}

impl<T> UVector<T> {
    /// An empty vector; no allocation.
    pub fn new() -> Self {
        Self {
            data: Vec::new().into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data.into_vec()
    }

    /// Bounds-checked access.
    pub fn at(&self, i: usize) -> Result<&T> {
        self.data
            .get(i)
            .ok_or_else(|| crate::XtensorError::IndexOutOfBounds {
                index: vec![i],
                shape: vec![self.data.len()],
            })
    }
}

impl<T: Clone> UVector<T> {
    pub fn from_elem(len: usize, value: T) -> Self {
        Self {
            data: vec![value; len].into_boxed_slice(),
        }
    }
}

impl<T: Default> UVector<T> {
    /// `len` default values.
    pub fn with_len(len: usize) -> Self {
        Self {
            data: (0..len).map(|_| T::default()).collect(),
        }
    }

    /// Reallocate to `len` default values; a no-op when the length is unchanged.
    pub fn resize(&mut self, len: usize) {
        if len != self.data.len() {
            self.data = (0..len).map(|_| T::default()).collect();
        }
    }
}

impl<T> Default for UVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UVector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T> Deref for UVector<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for UVector<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> From<Vec<T>> for UVector<T> {
    fn from(v: Vec<T>) -> Self {
        Self {
            data: v.into_boxed_slice(),
        }
    }
}

impl<T> FromIterator<T> for UVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a UVector<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: Clone + Default> Storage for UVector<T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
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
        UVector::resize(self, len);
        Ok(())
    }
}

impl<T: Clone + Default> OwnedStorage for UVector<T> {
    fn from_elem(len: usize, value: T) -> Result<Self> {
        Ok(UVector::from_elem(len, value))
    }

    fn from_vec(data: Vec<T>) -> Result<Self> {
        Ok(data.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor() {
        let a: UVector<i32> = UVector::new();
        assert_eq!(a.len(), 0);
        let b = UVector::from_elem(5, 2.5);
        assert_eq!(b.len(), 5);
        assert!(b.iter().all(|&x| x == 2.5));
        let c: UVector<u8> = UVector::with_len(3);
        assert_eq!(&c[..], &[0, 0, 0]);
    }

    #[test]
    fn test_resize() {
        let mut a = UVector::from_elem(4, 1i32);
        let ptr = a.as_ptr();
        a.resize(4);
        assert_eq!(a.as_ptr(), ptr);
        a.resize(8);
        assert_eq!(a.len(), 8);
        assert!(a.iter().all(|&x| x == 0));
        a.resize(0);
        assert!(a.is_empty());
    }

    #[test]
    fn test_access() {
        let mut a: UVector<i32> = (0..6).collect();
        a[2] = 10;
        assert_eq!(a[2], 10);
        assert_eq!(*a.at(5).unwrap(), 5);
        assert!(a.at(6).is_err());
    }

    #[test]
    fn test_move_leaves_source_empty() {
        let mut a = UVector::from_elem(3, 1.0);
        let b = std::mem::take(&mut a);
        assert!(a.is_empty());
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn test_iterator() {
        let a: UVector<i32> = vec![1, 2, 3].into();
        let sum: i32 = (&a).into_iter().sum();
        assert_eq!(sum, 6);
        assert_eq!(a.clone().into_vec(), vec![1, 2, 3]);
    }
}
