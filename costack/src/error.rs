use crate::runtime::coroutine::{CoroutineHandle, CoroutineId};

use std::io;
use thiserror::Error;

/// Errors reported by the coroutine runtime.
///
/// Two families are distinguished: contract violations, where the caller used
/// the API in a way the runtime cannot honor, and resource exhaustion, where
/// an allocation or a platform primitive failed.
#[derive(Debug, Error)]
pub enum Error {
    /// `yield_now` was called while no runtime drives coroutines on this
    /// thread.
    #[error("yield_now called with no active runtime on this thread")]
    OutsideRuntime,

    /// `yield_now` was called from the main context of the active runtime.
    #[error("yield_now called from the main context")]
    YieldFromMain,

    /// `wait` was called from inside a coroutine instead of the main context.
    /// The handle is given back untouched.
    #[error("wait called from coroutine {current}, only the main context may join")]
    WaitFromCoroutine {
        current: CoroutineId,
        handle: CoroutineHandle,
    },

    /// The handle was issued by another runtime. It is given back untouched.
    #[error("coroutine handle {} belongs to another runtime", .0.id)]
    ForeignHandle(CoroutineHandle),

    /// The handle no longer names a live occupant of its slot.
    #[error("coroutine handle is stale")]
    StaleHandle,

    /// A scheduling decision was needed but nothing is runnable.
    #[error("no runnable coroutine to schedule")]
    NoRunnable,

    /// The dedicated stack for a new coroutine could not be allocated.
    #[error("failed to allocate a {size}-byte coroutine stack")]
    StackAllocation { size: usize },

    /// The slot table could not be grown.
    #[error("failed to grow the coroutine registry to {requested} slots")]
    RegistryGrowth { requested: usize },

    /// Saving or restoring a machine context failed.
    #[error("context switch failed: {0}")]
    ContextSwitch(#[source] io::Error),

    /// The coroutine body panicked. The coroutine is still reclaimed.
    #[error("coroutine {id} ({name}) panicked")]
    Panicked { id: CoroutineId, name: String },
}

impl Error {
    /// Recovers the handle carried by a rejected `wait`, so the coroutine can
    /// still be joined later.
    pub fn into_handle(self) -> Option<CoroutineHandle> {
        match self {
            Error::WaitFromCoroutine { handle, .. } | Error::ForeignHandle(handle) => Some(handle),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
