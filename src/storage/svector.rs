//! Small-buffer vector with inline storage and heap spill.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::{OwnedStorage, Storage};
use crate::{Result, XtensorError};

/// A resizable vector storing up to `N` elements inline.
///
/// Shapes and strides of rank at most `N` never allocate. Growing past the
/// inline capacity moves the elements into a heap block of at least
/// `2 * len + 1` slots; the vector stays on the heap afterwards, even when
/// it shrinks again.
///
/// Moving an `SVector` copies the inline buffer or the heap handle; there
/// are no self-references to patch up, so moves need no special casing.
#[derive(Clone)]
pub struct SVector<T, const N: usize = { crate::SVECTOR_INLINE }> {
    repr: Repr<T, N>,
}

#[derive(Clone)]
enum Repr<T, const N: usize> {
    Inline { buf: [T; N], len: usize },
    Heap(Vec<T>),
}

impl<T: Default, const N: usize> SVector<T, N> {
    pub fn new() -> Self {
        Self {
            repr: Repr::Inline {
                buf: std::array::from_fn(|_| T::default()),
                len: 0,
            },
        }
    }

    /// `len` default values.
    pub fn with_len(len: usize) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new();
        v.resize(len);
        v
    }

    /// `len` copies of `value`.
    pub fn from_elem(value: T, len: usize) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new();
        v.assign(len, value);
        v
    }

    pub fn from_slice(values: &[T]) -> Self
    where
        T: Clone,
    {
        let mut v = Self::new();
        v.reserve(values.len());
        for x in values {
            v.push(x.clone());
        }
        v
    }
}

impl<T, const N: usize> SVector<T, N> {
    #[inline]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline { len, .. } => *len,
            Repr::Heap(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements storable without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        match &self.repr {
            Repr::Inline { .. } => N,
            Repr::Heap(v) => v.capacity(),
        }
    }

    /// Whether the elements live in the inline buffer.
    #[inline]
    pub fn on_stack(&self) -> bool {
        matches!(self.repr, Repr::Inline { .. })
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.repr {
            Repr::Inline { buf, len } => &buf[..*len],
            Repr::Heap(v) => v,
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.repr {
            Repr::Inline { buf, len } => &mut buf[..*len],
            Repr::Heap(v) => v,
        }
    }

    /// Bounds-checked access.
    pub fn at(&self, i: usize) -> Result<&T> {
        let len = self.len();
        self.as_slice()
            .get(i)
            .ok_or_else(|| XtensorError::IndexOutOfBounds {
                index: vec![i],
                shape: vec![len],
            })
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, i: usize) -> Result<&mut T> {
        let len = self.len();
        self.as_mut_slice()
            .get_mut(i)
            .ok_or_else(|| XtensorError::IndexOutOfBounds {
                index: vec![i],
                shape: vec![len],
            })
    }
}

impl<T: Default, const N: usize> SVector<T, N> {
    /// Move to a heap block holding at least `min_capacity` elements.
    fn grow(&mut self, min_capacity: usize) {
        let new_capacity = (2 * self.len() + 1).max(min_capacity);
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                let mut heap = Vec::with_capacity(new_capacity);
                heap.extend(buf[..*len].iter_mut().map(std::mem::take));
                trace!(len = heap.len(), capacity = new_capacity, "svector spilled to heap");
                self.repr = Repr::Heap(heap);
            }
            Repr::Heap(v) => {
                let additional = new_capacity - v.len();
                v.reserve_exact(additional);
            }
        }
    }

    /// Make room for at least `capacity` elements.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.grow(capacity);
        }
    }

    pub fn push(&mut self, value: T) {
        if self.len() == self.capacity() {
            self.grow(self.len() + 1);
        }
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                buf[*len] = value;
                *len += 1;
            }
            Repr::Heap(v) => v.push(value),
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                if *len == 0 {
                    return None;
                }
                *len -= 1;
                Some(std::mem::take(&mut buf[*len]))
            }
            Repr::Heap(v) => v.pop(),
        }
    }

    /// Insert `value` at position `index`, shifting later elements right.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len(), "insertion index out of range");
        if self.len() == self.capacity() {
            self.grow(self.len() + 1);
        }
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                buf[*len] = value;
                buf[index..=*len].rotate_right(1);
                *len += 1;
            }
            Repr::Heap(v) => v.insert(index, value),
        }
    }

    /// Remove and return the element at `index`, shifting later elements left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len(), "removal index out of range");
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                let out = std::mem::take(&mut buf[index]);
                buf[index..*len].rotate_left(1);
                *len -= 1;
                out
            }
            Repr::Heap(v) => v.remove(index),
        }
    }

    /// Drop elements past `len`.
    pub fn truncate(&mut self, new_len: usize) {
        match &mut self.repr {
            Repr::Inline { buf, len } => {
                if new_len < *len {
                    for slot in &mut buf[new_len..*len] {
                        *slot = T::default();
                    }
                    *len = new_len;
                }
            }
            Repr::Heap(v) => v.truncate(new_len),
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resize to `len`, keeping the prefix and default-filling new slots.
    pub fn resize(&mut self, len: usize)
    where
        T: Clone,
    {
        if len > self.capacity() {
            self.grow(len);
        }
        if len < self.len() {
            self.truncate(len);
        } else {
            while self.len() < len {
                self.push(T::default());
            }
        }
    }

    /// Replace the contents by `len` copies of `value`.
    pub fn assign(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        if len > self.capacity() {
            self.grow(len);
        }
        self.clear();
        for _ in 0..len {
            self.push(value.clone());
        }
    }

    /// Exchange contents with `other`.
    ///
    /// Heap blocks are exchanged by handle. Two inline vectors exchange
    /// their common prefix element-wise, then the longer one hands its tail
    /// to the shorter one, so both stay inline. Mixed pairs exchange
    /// representations.
    pub fn swap(&mut self, other: &mut Self) {
        match (&mut self.repr, &mut other.repr) {
            (Repr::Heap(a), Repr::Heap(b)) => std::mem::swap(a, b),
            (
                Repr::Inline {
                    buf: buf_a,
                    len: len_a,
                },
                Repr::Inline {
                    buf: buf_b,
                    len: len_b,
                },
            ) => {
                let (short, short_len, long, long_len) = if *len_a < *len_b {
                    (buf_a, len_a, buf_b, len_b)
                } else {
                    (buf_b, len_b, buf_a, len_a)
                };
                let common = *short_len;
                for i in 0..common {
                    std::mem::swap(&mut short[i], &mut long[i]);
                }
                for i in common..*long_len {
                    short[i] = std::mem::take(&mut long[i]);
                }
                std::mem::swap(short_len, long_len);
            }
            _ => std::mem::swap(&mut self.repr, &mut other.repr),
        }
    }
}

impl<T: Default, const N: usize> Default for SVector<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for SVector<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice().iter()).finish()
    }
}

impl<T, const N: usize> Deref for SVector<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for SVector<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for SVector<T, N> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> AsMut<[T]> for SVector<T, N> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: PartialEq, const N: usize, const M: usize> PartialEq<SVector<T, M>> for SVector<T, N> {
    fn eq(&self, other: &SVector<T, M>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, const N: usize> Eq for SVector<T, N> {}

impl<T: PartialEq, const N: usize> PartialEq<[T]> for SVector<T, N> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize, const K: usize> PartialEq<[T; K]> for SVector<T, N> {
    fn eq(&self, other: &[T; K]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: PartialEq, const N: usize> PartialEq<Vec<T>> for SVector<T, N> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Default, const N: usize> FromIterator<T> for SVector<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<T: Default, const N: usize> Extend<T> for SVector<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.len() + lower);
        for x in iter {
            self.push(x);
        }
    }
}

impl<T: Default + Clone, const N: usize> From<&[T]> for SVector<T, N> {
    fn from(values: &[T]) -> Self {
        Self::from_slice(values)
    }
}

impl<T: Default, const N: usize, const K: usize> From<[T; K]> for SVector<T, N> {
    fn from(values: [T; K]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Default, const N: usize> From<Vec<T>> for SVector<T, N> {
    fn from(values: Vec<T>) -> Self {
        if values.len() > N {
            Self {
                repr: Repr::Heap(values),
            }
        } else {
            values.into_iter().collect()
        }
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a SVector<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: Clone + Default, const N: usize> Storage for SVector<T, N> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        SVector::len(self)
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        SVector::as_slice(self)
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        SVector::as_mut_slice(self)
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        SVector::resize(self, len);
        Ok(())
    }
}

impl<T: Clone + Default, const N: usize> OwnedStorage for SVector<T, N> {
    fn from_elem(len: usize, value: T) -> Result<Self> {
        Ok(SVector::from_elem(value, len))
    }

    fn from_vec(data: Vec<T>) -> Result<Self> {
        Ok(data.into())
    }
}
