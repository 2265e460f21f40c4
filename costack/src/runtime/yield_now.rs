use super::context;
use super::coroutine::CoroutineId;
use super::scheduler;
use crate::error::{Error, Result};

/// Yields execution to another coroutine.
///
/// The next coroutine is drawn uniformly at random among every runnable
/// coroutine, the caller included. If the caller draws itself the call
/// returns immediately. Otherwise the caller is suspended and resumes
/// right here once it is selected again.
///
/// # Errors
///
/// - [`Error::OutsideRuntime`] when no runtime is driving coroutines on
///   this thread.
/// - [`Error::YieldFromMain`] when called from the main context.
/// - [`Error::ContextSwitch`] if the platform failed to switch contexts.
///
/// # Examples
///
/// ```rust,ignore
/// runtime.spawn("ticker", |ticks: u32| {
///     for _ in 0..ticks {
///         // Allow other coroutines to run
///         yield_now().expect("inside a coroutine");
///     }
/// }, 3)?;
/// ```
pub fn yield_now() -> Result<()> {
    let Some(runtime) = context::current_runtime() else {
        return Err(Error::OutsideRuntime);
    };

    let Some(transfer) = scheduler::prepare_yield(&runtime)? else {
        return Ok(());
    };

    // A suspended coroutine may never be resumed; it must not own a
    // reference to the runtime while parked.
    drop(runtime);

    // Safety: no scheduler borrow is alive and only main reclaims slots,
    // which it cannot do while this coroutine is still runnable.
    if let Err(err) = unsafe { transfer.perform() } {
        if let Some(runtime) = context::current_runtime() {
            runtime.borrow_mut().registry.activate(transfer.from_id);
        }

        return Err(err);
    }

    Ok(())
}

/// Returns the id of the coroutine currently executing, or `None` when no
/// runtime is driving coroutines on this thread.
pub fn current() -> Option<CoroutineId> {
    let runtime = context::current_runtime()?;
    let current = runtime.borrow().registry.current();

    Some(current)
}
