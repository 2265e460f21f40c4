use crate::runtime::scheduler::Shared;

use std::cell::RefCell;

thread_local! {
    /// Thread-local handle to the runtime currently driving coroutines.
    ///
    /// This is set while [`Runtime::wait`](crate::Runtime::wait) runs, which
    /// is the only time coroutine bodies execute. It lets the trampoline and
    /// [`yield_now`](crate::yield_now) reach the scheduler without a handle
    /// being threaded through user code.
    pub(crate) static CURRENT_RUNTIME: RefCell<Option<Shared>> =
        const { RefCell::new(None) };
}

/// Enters the runtime execution context for the current thread.
///
/// This function temporarily installs `runtime` as the thread's current
/// runtime for the duration of the closure `f`. After the closure completes,
/// the previous context is restored, so runtimes driven from inside another
/// runtime's coroutine nest correctly.
pub(crate) fn enter_context<R>(runtime: Shared, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_RUNTIME.with(|r| r.replace(Some(runtime)));

    let out = f();

    CURRENT_RUNTIME.with(|r| r.replace(prev));

    out
}

/// Returns the runtime installed on this thread, if any.
///
/// The returned handle must not be held across a context switch: a
/// coroutine that is never resumed would keep the runtime alive forever.
pub(crate) fn current_runtime() -> Option<Shared> {
    CURRENT_RUNTIME.with(|r| r.borrow().clone())
}
