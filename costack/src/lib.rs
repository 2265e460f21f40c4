//! # Costack
//!
//! **Costack** is a single-threaded, cooperative, stackful coroutine runtime.
//!
//! Coroutines share one OS thread. Each one owns a dedicated call stack, so it
//! can suspend itself at any call depth with [`yield_now`]. Control only ever
//! changes hands at an explicit yield or when a coroutine body returns; there
//! is no preemption and no parallelism.
//!
//! Scheduling is deliberately simple: every selection draws uniformly at
//! random among the runnable coroutines. The draw is seedable through
//! [`RuntimeBuilder::seed`] so that interleavings can be reproduced in tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use costack::{RuntimeBuilder, yield_now};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let runtime = RuntimeBuilder::new().seed(7).build()?;
//! let counter = Rc::new(Cell::new(0));
//!
//! let handle = runtime.spawn("worker", |counter: Rc<Cell<u32>>| {
//!     for _ in 0..3 {
//!         counter.set(counter.get() + 1);
//!         yield_now().expect("inside a coroutine");
//!     }
//! }, counter.clone())?;
//!
//! runtime.wait(handle)?;
//! assert_eq!(counter.get(), 3);
//! ```
//!
//! ## Debugging
//!
//! Set `COSTACK_DEBUG=1` to trace spawns, switches, terminations and reclaims
//! on stderr.

// Debug logging (COSTACK_DEBUG=1 to enable)
macro_rules! trace {
    ($($arg:tt)*) => {
        if $crate::utils::debug_enabled() {
            eprintln!("[costack] {}", format!($($arg)*));
        }
    };
}

mod error;
mod runtime;
mod utils;

pub use error::{Error, Result};
pub use runtime::builder::RuntimeBuilder;
pub use runtime::coroutine::{CoroutineHandle, CoroutineId, MAX_NAME_LEN, Status};
pub use runtime::yield_now::{current, yield_now};
pub use runtime::Runtime;
