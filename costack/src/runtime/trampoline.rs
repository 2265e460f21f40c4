use super::context;
use super::coroutine::CoroutineId;
use super::registry::Registry;

use std::panic::{self, AssertUnwindSafe};
use std::process;

/// First code run on a fresh coroutine stack.
///
/// Bookkeeping around the user body lives here so that statuses stay
/// consistent however many times the body yields:
/// 1. mark the previous coroutine `Suspended` and this one `Running`,
/// 2. run the entry body, catching any panic so unwinding never crosses
///    the context boundary,
/// 3. mark this coroutine `Dead` and make main current again.
///
/// Returning from this function resumes main's context, which was set as
/// the link target when the context was prepared.
pub(crate) extern "C" fn trampoline(slot: libc::c_int) {
    let id = CoroutineId(slot as usize);

    let entry = with_registry(|registry| {
        registry.activate(id);
        registry.take_entry(id)
    });

    let panicked = match entry {
        Some(entry) => panic::catch_unwind(AssertUnwindSafe(entry)).is_err(),
        None => false,
    };

    with_registry(|registry| {
        trace!(
            "exit {} {}{}",
            id,
            registry.name(id),
            if panicked { " (panicked)" } else { "" }
        );
        registry.finish(id, panicked);
    });
}

/// Runs `f` against the registry of the active runtime.
///
/// The runtime handle is dropped before returning, so nothing on the
/// coroutine stack keeps the runtime alive while the body runs.
fn with_registry<R>(f: impl FnOnce(&mut Registry) -> R) -> R {
    let Some(runtime) = context::current_runtime() else {
        eprintln!("costack: coroutine resumed without an active runtime");
        process::abort();
    };

    let mut scheduler = runtime.borrow_mut();
    f(&mut scheduler.registry)
}
