//! Machine context save/restore.
//!
//! This is the only module that touches the platform's context primitives.
//! It wraps glibc's `ucontext_t` family (`getcontext`, `makecontext`,
//! `swapcontext`) behind [`MachineContext`] and [`switch`], so the
//! scheduler never deals with registers or stack pointers directly.

use super::stack::Stack;
use crate::error::{Error, Result};

use std::cell::UnsafeCell;
use std::io;
use std::mem::MaybeUninit;

#[cfg(not(all(target_os = "linux", target_env = "gnu", target_arch = "x86_64")))]
compile_error!("costack only supports Linux/glibc on x86_64");

/// Function run on a fresh context. Receives the coroutine's slot index.
pub(crate) type ContextEntry = extern "C" fn(libc::c_int);

/// Saved execution state of one coroutine.
///
/// glibc's `ucontext_t` points into itself once saved, so a context must
/// stay at a fixed address from the first `prepare` or `switch` onward.
/// Descriptors are boxed for that reason.
pub(crate) struct MachineContext {
    inner: UnsafeCell<libc::ucontext_t>,
}

impl MachineContext {
    /// Returns an all-zero context, suitable as a save target.
    pub(crate) fn empty() -> Self {
        // Safety: `ucontext_t` is plain data; all-zero is a valid bit pattern.
        let inner = unsafe { MaybeUninit::<libc::ucontext_t>::zeroed().assume_init() };

        Self {
            inner: UnsafeCell::new(inner),
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut libc::ucontext_t {
        self.inner.get()
    }

    /// Binds this context to `stack` so that the first switch into it calls
    /// `entry(arg)`. When `entry` returns, execution continues at `link`.
    ///
    /// # Safety
    ///
    /// - `self` must not move until the context is no longer used.
    /// - `stack` must outlive every execution of the context.
    /// - `link` must point to a context that is valid whenever `entry`
    ///   returns.
    pub(crate) unsafe fn prepare(
        &mut self,
        stack: &Stack,
        link: *mut libc::ucontext_t,
        entry: ContextEntry,
        arg: libc::c_int,
    ) -> Result<()> {
        let ctx = self.as_ptr();

        // Safety: `ctx` points to an owned, pinned `ucontext_t`.
        if unsafe { libc::getcontext(ctx) } != 0 {
            return Err(Error::ContextSwitch(io::Error::last_os_error()));
        }

        // Safety: the caller guarantees `stack` and `link` stay valid.
        unsafe {
            (*ctx).uc_stack.ss_sp = stack.base().cast();
            (*ctx).uc_stack.ss_size = stack.len();
            (*ctx).uc_stack.ss_flags = 0;
            (*ctx).uc_link = link;

            // `makecontext` takes a nullary function pointer and forwards the
            // variadic integer arguments to it.
            let entry: extern "C" fn() = std::mem::transmute::<ContextEntry, extern "C" fn()>(entry);
            libc::makecontext(ctx, entry, 1, arg);
        }

        Ok(())
    }
}

/// Saves the running context into `from` and resumes `to`.
///
/// Returns once some other context switches back into `from`.
///
/// # Safety
///
/// Both pointers must refer to live, pinned contexts; `to` must have been
/// prepared or previously saved into.
pub(crate) unsafe fn switch(
    from: *mut libc::ucontext_t,
    to: *const libc::ucontext_t,
) -> Result<()> {
    // Safety: forwarded to the caller.
    if unsafe { libc::swapcontext(from, to) } != 0 {
        return Err(Error::ContextSwitch(io::Error::last_os_error()));
    }

    Ok(())
}
