//! Fallible heap slots for records handed across the C boundary.
//!
//! `Box::new` aborts on allocation failure; the legacy ABI wants `-ENOMEM`
//! instead. A [`Slot`] is reserved before any backend call and either filled
//! (ownership moves to the host) or freed on drop.

use std::alloc::{alloc, dealloc, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use hal::{HalError, Result};

/// Uninitialised, owned heap memory for one `T`.
pub(crate) struct Slot<T> {
    ptr: NonNull<T>,
    _owns: PhantomData<T>,
}

impl<T> Slot<T> {
    /// Reserve memory for one `T`, or fail with [`HalError::NoMemory`].
    pub(crate) fn try_new() -> Result<Self> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                _owns: PhantomData,
            });
        }
        // SAFETY: `layout` has non-zero size.
        let raw = unsafe { alloc(layout) }.cast::<T>();
        let ptr = NonNull::new(raw).ok_or_else(|| {
            tracing::error!(size = layout.size(), "record allocation failed");
            HalError::NoMemory
        })?;
        Ok(Self {
            ptr,
            _owns: PhantomData,
        })
    }

    /// Move `value` into the slot and hand out the owning pointer.
    ///
    /// The pointer must eventually be passed to [`reclaim`] exactly once.
    pub(crate) fn fill(self, value: T) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        // SAFETY: `ptr` is valid for writes of one `T` and not yet initialised.
        unsafe { ptr.as_ptr().write(value) };
        ptr
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        let layout = Layout::new::<T>();
        if layout.size() != 0 {
            // SAFETY: the slot was allocated with this layout and never filled.
            unsafe { dealloc(self.ptr.as_ptr().cast(), layout) };
        }
    }
}

/// Take back a record produced by [`Slot::fill`], freeing its memory.
///
/// # Safety
///
/// `ptr` must come from [`Slot::fill`] for the same `T` and must not have
/// been reclaimed before.
pub(crate) unsafe fn reclaim<T>(ptr: NonNull<T>) -> T {
    // SAFETY: memory from `Slot` uses the global allocator with
    // `Layout::new::<T>()`, which is what `Box` expects; the caller
    // guarantees the record is live and owned.
    *unsafe { Box::from_raw(ptr.as_ptr()) }
}
