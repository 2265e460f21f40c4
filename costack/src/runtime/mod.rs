//! Core runtime components.
//!
//! This module contains the fundamental building blocks of the runtime,
//! including the coroutine registry, the context-switch machinery and the
//! random scheduler.
//!
//! It is responsible for:
//! - allocating coroutine slots, stacks and execution contexts,
//! - running each coroutine body through the trampoline,
//! - choosing the next coroutine and transferring control to it,
//! - joining terminated coroutines and reclaiming their resources.
//!
//! Most users will interact with [`Runtime`], [`RuntimeBuilder`] and
//! [`yield_now`](crate::yield_now) rather than using this module directly.
//!
//! [`RuntimeBuilder`]: crate::RuntimeBuilder

mod join;
mod machine;
mod registry;
mod scheduler;
mod stack;
mod trampoline;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod coroutine;
pub(crate) mod yield_now;

use coroutine::{CoroutineHandle, CoroutineId, Entry, Status, bounded_name};
use registry::Registry;
use scheduler::{Scheduler, Shared};

use crate::error::{Error, Result};

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// The coroutine runtime.
///
/// `Runtime` is responsible for:
/// - spawning coroutines, each with its own stack,
/// - driving them from the main context via [`wait`](Self::wait),
/// - reclaiming their slots and stacks once joined.
///
/// A runtime is bound to the thread that built it and is `!Send`. Several
/// runtimes may coexist on one thread.
///
/// Dropping the runtime frees every remaining descriptor and stack.
/// Coroutines that were never joined are abandoned where they stand: their
/// stacks are not unwound, so values they hold are leaked rather than
/// dropped.
pub struct Runtime {
    /// Distinguishes handles issued by different runtimes.
    id: u64,

    /// Registry and scheduler, shared with the thread-local context.
    shared: Shared,
}

impl Runtime {
    /// Creates a new runtime instance.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Initial number of registry slots, main included.
    /// * `stack_size` - Size of every coroutine stack, in bytes.
    /// * `seed` - Seed for the scheduler; `None` draws one from the OS.
    pub(crate) fn new(capacity: usize, stack_size: usize, seed: Option<u64>) -> Result<Self> {
        let registry = Registry::new(capacity)?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let id = NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed);
        trace!(
            "runtime {} capacity={} stack_size={} seed={:?}",
            id, capacity, stack_size, seed
        );

        Ok(Self {
            id,
            shared: Rc::new(RefCell::new(Scheduler::new(registry, rng, stack_size))),
        })
    }

    /// Spawns a coroutine that will run `entry(arg)` on its own stack.
    ///
    /// The coroutine starts `Suspended` and does not run until the
    /// scheduler selects it during a [`wait`](Self::wait). `arg` is moved
    /// into the coroutine and handed to `entry` exactly once.
    ///
    /// Names longer than [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) bytes are
    /// truncated.
    ///
    /// # Errors
    ///
    /// - [`Error::StackAllocation`] if the stack cannot be allocated.
    /// - [`Error::RegistryGrowth`] if the slot table cannot grow.
    /// - [`Error::ContextSwitch`] if the context cannot be initialized.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn("greeter", |who: &str| {
    ///     println!("hello, {who}");
    /// }, "world")?;
    /// runtime.wait(handle)?;
    /// ```
    pub fn spawn<T, F>(&self, name: &str, entry: F, arg: T) -> Result<CoroutineHandle>
    where
        F: FnOnce(T) + 'static,
        T: 'static,
    {
        let body: Entry = Box::new(move || entry(arg));

        let mut scheduler = self.shared.borrow_mut();
        let stack_size = scheduler.stack_size;
        let (id, generation) = scheduler.registry.spawn(name, body, stack_size)?;

        Ok(CoroutineHandle {
            runtime: self.id,
            id,
            generation,
            name: bounded_name(name),
        })
    }

    /// Blocks the main context until the coroutine behind `handle` has
    /// terminated, then frees its stack and slot.
    ///
    /// While waiting, randomly selected coroutines run; the target is not
    /// favored. The slot may be reused by the next [`spawn`](Self::spawn).
    ///
    /// # Errors
    ///
    /// - [`Error::ForeignHandle`] if the handle belongs to another runtime.
    /// - [`Error::WaitFromCoroutine`] if called from inside a coroutine.
    /// - [`Error::Panicked`] if the body panicked. The coroutine is still
    ///   reclaimed.
    ///
    /// The first two give the handle back; see [`Error::into_handle`].
    pub fn wait(&self, handle: CoroutineHandle) -> Result<()> {
        if handle.runtime != self.id {
            return Err(Error::ForeignHandle(handle));
        }

        let current = self.shared.borrow().registry.current();
        if current != CoroutineId::MAIN {
            return Err(Error::WaitFromCoroutine { current, handle });
        }

        context::enter_context(self.shared.clone(), || {
            join::wait(&self.shared, handle.id, handle.generation)
        })
    }

    /// Current status of the coroutine behind `handle`.
    ///
    /// Returns `None` if the handle belongs to another runtime.
    pub fn status(&self, handle: &CoroutineHandle) -> Option<Status> {
        if handle.runtime != self.id {
            return None;
        }

        self.shared
            .borrow()
            .registry
            .status(handle.id, handle.generation)
    }

    /// Number of spawned coroutines that have not terminated yet.
    pub fn live_count(&self) -> usize {
        self.shared.borrow().registry.live_count()
    }

    /// Number of registry slots, occupied or not.
    pub fn capacity(&self) -> usize {
        self.shared.borrow().registry.capacity()
    }

    /// Number of coroutines spawned but not yet joined, dead ones included.
    pub fn pending_joins(&self) -> usize {
        self.shared.borrow().registry.occupied() - 1
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let pending = self.pending_joins();

        if pending > 0 {
            trace!("runtime {} dropped with {} unjoined coroutines", self.id, pending);
        }
    }
}
