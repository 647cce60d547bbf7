//! Buffer adaptors over externally supplied memory.
//!
//! Three ownership regimes share the [`Storage`] interface so containers do
//! not care which one backs them:
//!
//! - [`BorrowedBuffer`]: no ownership. The extent is fixed by the source and
//!   the memory is never freed by the adaptor.
//! - [`OwnedBuffer`]: acquired ownership. The adaptor frees the memory on
//!   drop and can reallocate it on resize.
//! - [`SharedBuffer`]: smart ownership. A captured owner (an `Rc`, an `Arc`,
//!   a `Box`, ...) or a destructor closure governs the lifetime of the data;
//!   the extent is fixed like a borrowed buffer.
//!
//! The raw-pointer constructors are `unsafe`: the adaptor cannot check that
//! the pointer stays valid for its lifetime.

use std::any::Any;
use std::fmt;
use std::ptr::NonNull;

use super::{not_resizable, Storage};
use crate::Result;

// ============================================================================
// BorrowedBuffer
// ============================================================================

/// A mutable view over memory owned elsewhere.
pub struct BorrowedBuffer<'a, T> {
    data: &'a mut [T],
}

impl<'a, T> BorrowedBuffer<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        Self { data }
    }

    /// Borrow `len` elements starting at `ptr`.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` elements for `'a`,
    /// and nothing else may access that memory while the buffer lives.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self {
            data: std::slice::from_raw_parts_mut(ptr, len),
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
}

impl<T: fmt::Debug> fmt::Debug for BorrowedBuffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorrowedBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}

impl<T: Clone + Default> Storage for BorrowedBuffer<'_, T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &*self.data
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        not_resizable(self.data.len(), len)
    }
}

// ============================================================================
// OwnedBuffer
// ============================================================================

/// Heap memory whose ownership was handed to the adaptor.
///
/// [`take`](Self::take) moves the memory into a new buffer and leaves the
/// source empty and marked as moved-from; dropping a moved-from buffer
/// frees nothing.
pub struct OwnedBuffer<T> {
    data: Option<Box<[T]>>,
}

impl<T> OwnedBuffer<T> {
    pub fn from_boxed_slice(data: Box<[T]>) -> Self {
        Self { data: Some(data) }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self::from_boxed_slice(data.into_boxed_slice())
    }

    /// Acquire `len` elements starting at `ptr`.
    ///
    /// # Safety
    /// `ptr` and `len` must come from a `Box<[T]>` (for instance through
    /// `Box::into_raw` or `Vec::into_boxed_slice`) that nothing else frees.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        let raw = std::ptr::slice_from_raw_parts_mut(ptr, len);
        Self::from_boxed_slice(Box::from_raw(raw))
    }

    /// Move the memory out, leaving `self` empty and moved-from.
    pub fn take(&mut self) -> Self {
        Self {
            data: self.data.take(),
        }
    }

    #[inline]
    pub fn is_moved_from(&self) -> bool {
        self.data.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data
            .as_ref()
            .map_or(std::ptr::null(), |d| d.as_ptr())
    }

    /// Release the memory to the caller.
    pub fn into_boxed_slice(mut self) -> Box<[T]> {
        self.data.take().unwrap_or_default()
    }
}

impl<T: Clone> Clone for OwnedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OwnedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedBuffer")
            .field("len", &self.len())
            .field("moved_from", &self.is_moved_from())
            .finish()
    }
}

impl<T: Clone + Default> Storage for OwnedBuffer<T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        OwnedBuffer::len(self)
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Reallocate, carrying the common prefix over and default-filling the rest.
    fn resize(&mut self, len: usize) -> Result<()> {
        if len == self.len() && self.data.is_some() {
            return Ok(());
        }
        let old = self.data.take().unwrap_or_default();
        let mut fresh: Vec<T> = Vec::with_capacity(len);
        fresh.extend(old.iter().take(len).cloned());
        fresh.resize(len, T::default());
        self.data = Some(fresh.into_boxed_slice());
        Ok(())
    }
}

// ============================================================================
// SharedBuffer
// ============================================================================

enum Guard {
    Owner(#[allow(dead_code)] Box<dyn Any>),
    Destructor(Option<Box<dyn FnOnce()>>),
}

/// Memory kept alive by a captured owner or released by a destructor.
///
/// The guard is dropped (or the destructor run) exactly once, when the
/// buffer is dropped. The extent is fixed: `resize` fails unless the size
/// is unchanged.
pub struct SharedBuffer<T> {
    ptr: NonNull<T>,
    len: usize,
    guard: Guard,
}

impl<T> SharedBuffer<T> {
    /// Adapt the memory of `owner`, which the buffer keeps alive.
    pub fn from_owner<O>(owner: O) -> Self
    where
        O: AsMut<[T]> + 'static,
    {
        let mut owner = Box::new(owner);
        let slice = AsMut::<[T]>::as_mut(&mut *owner);
        let len = slice.len();
        let ptr = NonNull::new(slice.as_mut_ptr()).unwrap_or(NonNull::dangling());
        Self {
            ptr,
            len,
            guard: Guard::Owner(owner),
        }
    }

    /// Adapt `len` elements at `ptr`, co-owned through `owner`.
    ///
    /// Typical owners are clones of an `Rc` or `Arc` holding the data: the
    /// reference count keeps the memory alive until this buffer drops.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` elements for as
    /// long as `owner` is alive, and no other handle may access or move the
    /// memory while the buffer lives.
    pub unsafe fn from_raw_parts_with_owner<O: 'static>(ptr: *mut T, len: usize, owner: O) -> Self {
        Self {
            ptr: NonNull::new(ptr).unwrap_or(NonNull::dangling()),
            len,
            guard: Guard::Owner(Box::new(owner)),
        }
    }

    /// Adapt `len` elements at `ptr`, running `destructor` when dropped.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` elements until
    /// `destructor` runs, and no other handle may access the memory while
    /// the buffer lives.
    pub unsafe fn with_destructor<F>(ptr: *mut T, len: usize, destructor: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            ptr: NonNull::new(ptr).unwrap_or(NonNull::dangling()),
            len,
            guard: Guard::Destructor(Some(Box::new(destructor))),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for SharedBuffer<T> {
    fn drop(&mut self) {
        if let Guard::Destructor(destructor) = &mut self.guard {
            if let Some(f) = destructor.take() {
                f();
            }
        }
    }
}

impl<T> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer").field("len", &self.len).finish()
    }
}

impl<T: Clone + Default> Storage for SharedBuffer<T> {
    type Elem = T;

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        // SAFETY: constructors guarantee `len` valid elements at `ptr`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` makes the access exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn resize(&mut self, len: usize) -> Result<()> {
        not_resizable(self.len, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XtensorError;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_borrowed_resize_rejected() {
        let mut data = vec![0.0f64; 10];
        let mut buf = unsafe { BorrowedBuffer::from_raw_parts(data.as_mut_ptr(), data.len()) };
        let err = Storage::resize(&mut buf, 5).unwrap_err();
        assert!(matches!(
            err,
            XtensorError::NotResizable {
                len: 10,
                requested: 5
            }
        ));
        assert_eq!(Storage::len(&buf), 10);
        assert!(Storage::resize(&mut buf, 10).is_ok());
    }

    #[test]
    fn test_borrowed_writes_through() {
        let mut data = [1, 2, 3];
        {
            let mut buf = BorrowedBuffer::new(&mut data);
            buf.as_mut_slice()[1] = 20;
        }
        assert_eq!(data, [1, 20, 3]);
    }

    #[test]
    fn test_owned_take() {
        let mut src = OwnedBuffer::from_vec(vec![1, 2, 3, 4]);
        let ptr = src.as_ptr();
        let dst = src.take();
        assert_eq!(src.len(), 0);
        assert!(src.is_moved_from());
        assert_eq!(dst.len(), 4);
        assert_eq!(dst.as_ptr(), ptr);
        drop(src);
        assert_eq!(dst.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_owned_resize_copies_prefix() {
        let mut buf = OwnedBuffer::from_vec(vec![1.0, 2.0, 3.0]);
        Storage::resize(&mut buf, 5).unwrap();
        assert_eq!(buf.as_slice(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
        Storage::resize(&mut buf, 2).unwrap();
        assert_eq!(buf.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn test_owned_from_raw_parts() {
        let boxed: Box<[u32]> = vec![7, 8].into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed) as *mut u32;
        let buf = unsafe { OwnedBuffer::from_raw_parts(ptr, len) };
        assert_eq!(buf.as_slice(), &[7, 8]);
        assert_eq!(&*buf.into_boxed_slice(), &[7, 8]);
    }

    #[test]
    fn test_shared_owner_lifetime() {
        let shared = Rc::new(RefCell::new(vec![1.0f64; 6]));
        let ptr = shared.borrow_mut().as_mut_ptr();
        let mut buf = unsafe { SharedBuffer::from_raw_parts_with_owner(ptr, 6, shared.clone()) };
        assert_eq!(Rc::strong_count(&shared), 2);
        buf.as_mut_slice()[0] = 5.0;
        assert!(Storage::resize(&mut buf, 3).is_err());
        assert_eq!(Storage::len(&buf), 6);
        drop(buf);
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(shared.borrow()[0], 5.0);
    }

    #[test]
    fn test_shared_destructor_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let mut data = vec![0i32; 4];
        let counter = calls.clone();
        let buf = unsafe {
            SharedBuffer::with_destructor(data.as_mut_ptr(), data.len(), move || {
                counter.set(counter.get() + 1)
            })
        };
        assert_eq!(buf.as_slice().len(), 4);
        drop(buf);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_shared_from_owner() {
        let buf = SharedBuffer::from_owner(vec![3u8, 4, 5]);
        assert_eq!(buf.as_slice(), &[3, 4, 5]);
        assert_eq!(buf.len(), 3);
    }
}
