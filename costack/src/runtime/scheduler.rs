use super::coroutine::CoroutineId;
use super::machine;
use super::registry::Registry;
use crate::error::{Error, Result};

use rand::Rng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Scheduler state shared between the runtime handle, the thread-local
/// context and the trampoline.
pub(crate) type Shared = Rc<RefCell<Scheduler>>;

/// Owns the registry and the random source used to pick the next coroutine.
///
/// Selection is uniform over the runnable set with a fresh draw each time.
/// There is no round-robin, aging or starvation prevention: a coroutine may
/// be picked many times in a row while another waits.
pub(crate) struct Scheduler {
    pub(crate) registry: Registry,
    rng: StdRng,
    /// Stack size handed to every new coroutine.
    pub(crate) stack_size: usize,
}

impl Scheduler {
    pub(crate) fn new(registry: Registry, rng: StdRng, stack_size: usize) -> Self {
        Self {
            registry,
            rng,
            stack_size,
        }
    }

    /// Draws one runnable coroutine uniformly at random.
    ///
    /// The caller of `yield_now` is still runnable and takes part in the
    /// draw.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRunnable`] if every non-main coroutine is `Dead`.
    pub(crate) fn select(&mut self) -> Result<CoroutineId> {
        let runnable = self.registry.runnable_count();

        if runnable == 0 {
            return Err(Error::NoRunnable);
        }

        let nth = self.rng.gen_range(0..runnable);

        self.registry.nth_runnable(nth).ok_or(Error::NoRunnable)
    }

    /// Marks `to` as running and captures both contexts.
    ///
    /// The switch itself happens after the scheduler borrow is released.
    fn transfer(&mut self, from: CoroutineId, to: CoroutineId) -> Transfer {
        let transfer = Transfer {
            from_id: from,
            from: self.registry.context_ptr(from),
            to: self.registry.context_ptr(to),
        };

        self.registry.activate(to);

        trace!(
            "switch {} {} -> {} {}",
            from,
            self.registry.name(from),
            to,
            self.registry.name(to)
        );

        transfer
    }
}

/// A context switch whose bookkeeping is already done.
pub(crate) struct Transfer {
    /// Coroutine that was running when the transfer was prepared.
    pub(crate) from_id: CoroutineId,
    from: *mut libc::ucontext_t,
    to: *const libc::ucontext_t,
}

impl Transfer {
    /// Suspends the calling context and resumes the target.
    ///
    /// Returns when the calling context is selected again.
    ///
    /// # Safety
    ///
    /// No borrow of the scheduler may be alive, and both descriptors must
    /// stay in their slots until control comes back.
    pub(crate) unsafe fn perform(&self) -> Result<()> {
        // Safety: forwarded to the caller.
        unsafe { machine::switch(self.from, self.to) }
    }
}

/// Picks the coroutine that continues after the current one yields.
///
/// Returns `None` when the draw lands on the caller itself: suspending and
/// immediately resuming the same context would be a no-op, so no switch is
/// made and the caller stays `Running`.
///
/// # Errors
///
/// - [`Error::YieldFromMain`] if main is the running coroutine.
/// - [`Error::NoRunnable`] if nothing can be selected.
pub(crate) fn prepare_yield(shared: &RefCell<Scheduler>) -> Result<Option<Transfer>> {
    let mut scheduler = shared.borrow_mut();
    let current = scheduler.registry.current();

    if current == CoroutineId::MAIN {
        return Err(Error::YieldFromMain);
    }

    let next = scheduler.select()?;

    if next == current {
        return Ok(None);
    }

    Ok(Some(scheduler.transfer(current, next)))
}

/// Picks a coroutine to run on behalf of main.
///
/// # Errors
///
/// Returns [`Error::NoRunnable`] if nothing can be selected.
///
/// # Panics
///
/// Panics if a coroutine, not main, is running. `Runtime::wait` rejects
/// that case before driving the scheduler.
pub(crate) fn prepare_resume(shared: &RefCell<Scheduler>) -> Result<Transfer> {
    let mut scheduler = shared.borrow_mut();
    let current = scheduler.registry.current();

    assert_eq!(current, CoroutineId::MAIN, "resume must start from the main context");

    let next = scheduler.select()?;

    Ok(scheduler.transfer(CoroutineId::MAIN, next))
}
