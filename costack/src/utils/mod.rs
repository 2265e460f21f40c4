//! Internal utilities.
//!
//! This module provides the [`Slab`] slot table backing the coroutine
//! registry, and the switch that gates debug tracing.

mod slab;

pub(crate) use slab::Slab;

use std::sync::OnceLock;

/// Returns `true` when `COSTACK_DEBUG=1` is set in the environment.
///
/// The variable is read once per process.
pub(crate) fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("COSTACK_DEBUG").is_ok_and(|v| v == "1"))
}
