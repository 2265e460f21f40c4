use crate::error::{Error, Result};

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Default size of a coroutine stack (64 KiB).
pub(crate) const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Smallest stack size the builder accepts.
pub(crate) const MIN_STACK_SIZE: usize = 16 * 1024;

const STACK_ALIGN: usize = 16;

/// A zero-initialized call stack exclusively owned by one coroutine.
///
/// There is no guard page: overflowing the stack is undefined behavior.
pub(crate) struct Stack {
    base: NonNull<u8>,
    layout: Layout,
}

impl Stack {
    /// Allocates a zeroed stack of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StackAllocation`] if the allocator refuses the
    /// request.
    pub(crate) fn new(size: usize) -> Result<Self> {
        let layout = Layout::from_size_align(size, STACK_ALIGN)
            .map_err(|_| Error::StackAllocation { size })?;

        if layout.size() == 0 {
            return Err(Error::StackAllocation { size });
        }

        // Safety: the layout has a non-zero size.
        let base = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(base).ok_or(Error::StackAllocation { size })?;

        Ok(Self { base, layout })
    }

    /// Lowest address of the stack region.
    pub(crate) fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    #[cfg(test)]
    fn as_slice(&self) -> &[u8] {
        // Safety: the region is allocated, initialized and owned by `self`.
        unsafe { std::slice::from_raw_parts(self.base.as_ptr(), self.len()) }
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        // Safety: `base` was returned by `alloc_zeroed` with this layout.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}
