use super::machine::{ContextEntry, MachineContext};
use super::stack::Stack;
use crate::error::Result;

use std::fmt;

/// Maximum length, in bytes, of a coroutine's display name.
///
/// Longer names are truncated at a character boundary.
pub const MAX_NAME_LEN: usize = 15;

/// Lifecycle state of a coroutine.
///
/// ```text
/// Suspended --selected--> Running --yield--> Suspended
///                         Running --entry returns--> Dead
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Created but not yet run, or parked at a yield point.
    Suspended,
    /// Currently executing. Exactly one coroutine is in this state.
    Running,
    /// The entry function has returned. Terminal.
    Dead,
}

/// Slot index of a coroutine inside its runtime's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoroutineId(pub(crate) usize);

impl CoroutineId {
    /// The main pseudo-coroutine: the context that builds the runtime and
    /// joins coroutines.
    pub const MAIN: CoroutineId = CoroutineId(0);

    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CoroutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A handle to a spawned coroutine.
///
/// The handle is consumed by [`Runtime::wait`](crate::Runtime::wait), so a
/// coroutine cannot be joined twice. It is neither `Clone` nor `Copy`.
///
/// Dropping a handle without waiting on it leaks the coroutine's slot and
/// stack until the runtime itself is dropped.
#[must_use = "every spawned coroutine must be joined with `Runtime::wait`"]
#[derive(Debug)]
pub struct CoroutineHandle {
    pub(crate) runtime: u64,
    pub(crate) id: CoroutineId,
    pub(crate) generation: u32,
    pub(crate) name: String,
}

impl CoroutineHandle {
    /// Slot the coroutine occupies.
    pub fn id(&self) -> CoroutineId {
        self.id
    }

    /// Display name given at spawn time, after truncation.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Type-erased entry function with its payload already bound.
pub(crate) type Entry = Box<dyn FnOnce()>;

/// Per-coroutine state owned by the registry.
///
/// Descriptors are always boxed: the machine context must not move once it
/// has been prepared or saved into.
pub(crate) struct Coroutine {
    pub(crate) id: CoroutineId,
    pub(crate) name: String,
    pub(crate) status: Status,
    /// Absent for the main pseudo-coroutine, which runs on the thread stack.
    pub(crate) stack: Option<Stack>,
    pub(crate) context: MachineContext,
    /// Taken by the trampoline on first resume.
    pub(crate) entry: Option<Entry>,
    /// Set when the entry body unwound instead of returning.
    pub(crate) panicked: bool,
}

impl Coroutine {
    /// Creates the descriptor for the main pseudo-coroutine.
    pub(crate) fn main() -> Box<Self> {
        Box::new(Self {
            id: CoroutineId::MAIN,
            name: String::from("main"),
            status: Status::Running,
            stack: None,
            context: MachineContext::empty(),
            entry: None,
            panicked: false,
        })
    }

    /// Creates a suspended descriptor. The context still has to be
    /// prepared in place once the box is at its final address.
    pub(crate) fn new(id: CoroutineId, name: &str, stack: Stack, entry: Entry) -> Box<Self> {
        Box::new(Self {
            id,
            name: bounded_name(name),
            status: Status::Suspended,
            stack: Some(stack),
            context: MachineContext::empty(),
            entry: Some(entry),
            panicked: false,
        })
    }

    /// Binds the context to this coroutine's stack so that the first
    /// switch into it runs `entry(slot)`, then continues at `link`.
    ///
    /// The main pseudo-coroutine has no stack and is left untouched: its
    /// context is filled in by the first switch away from it.
    ///
    /// # Safety
    ///
    /// `self` must be at its final heap address and `link` must stay valid
    /// for as long as this coroutine can run.
    pub(crate) unsafe fn prepare(
        &mut self,
        link: *mut libc::ucontext_t,
        entry: ContextEntry,
        slot: libc::c_int,
    ) -> Result<()> {
        let Some(stack) = self.stack.as_ref() else {
            return Ok(());
        };

        // Safety: forwarded to the caller; the stack is owned by `self`.
        unsafe { self.context.prepare(stack, link, entry, slot) }
    }

    pub(crate) fn is_runnable(&self) -> bool {
        self.id != CoroutineId::MAIN && self.status != Status::Dead
    }
}

/// Truncates `name` to at most [`MAX_NAME_LEN`] bytes without splitting a
/// character.
pub(crate) fn bounded_name(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_owned();
    }

    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    name[..end].to_owned()
}
