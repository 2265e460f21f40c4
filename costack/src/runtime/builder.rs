use super::Runtime;
use super::stack::{DEFAULT_STACK_SIZE, MIN_STACK_SIZE};
use crate::error::Result;

/// Default number of registry slots, main included.
const DEFAULT_CAPACITY: usize = 32;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` allows customizing runtime parameters before
/// constructing the runtime: the initial registry capacity, the size of
/// each coroutine stack, and the scheduler seed.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .capacity(64)
///     .stack_size(128 * 1024)
///     .seed(7)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    /// Initial number of registry slots.
    capacity: usize,

    /// Size of every coroutine stack, in bytes.
    stack_size: usize,

    /// Fixed scheduler seed, for reproducible interleavings.
    seed: Option<u64>,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// By default the registry starts with 32 slots, each coroutine gets a
    /// 64 KiB stack, and the scheduler is seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            stack_size: DEFAULT_STACK_SIZE,
            seed: None,
        }
    }

    /// Sets the initial number of registry slots.
    ///
    /// The registry doubles whenever it runs out of slots, so this only
    /// affects when the first growth happens.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "capacity must be > 0");

        self.capacity = n;
        self
    }

    /// Sets the size of every coroutine stack.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is below 16 KiB.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(
            bytes >= MIN_STACK_SIZE,
            "stack_size must be >= {MIN_STACK_SIZE} bytes"
        );

        self.stack_size = bytes;
        self
    }

    /// Seeds the scheduler's random source.
    ///
    /// Two runtimes built with the same seed and driven by the same program
    /// make the same scheduling decisions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the runtime with the configured options.
    ///
    /// This allocates the registry and installs the main pseudo-coroutine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryGrowth`](crate::Error::RegistryGrowth) if the
    /// registry cannot be allocated.
    pub fn build(self) -> Result<Runtime> {
        Runtime::new(self.capacity, self.stack_size, self.seed)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let builder = RuntimeBuilder::default();

        assert_eq!(builder.capacity, 32);
        assert_eq!(builder.stack_size, 64 * 1024);
        assert!(builder.seed.is_none());
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = RuntimeBuilder::new().capacity(0);
    }

    #[test]
    #[should_panic(expected = "stack_size must be >=")]
    fn tiny_stack_panics() {
        let _ = RuntimeBuilder::new().stack_size(1024);
    }

    #[test]
    fn build_installs_main_only() {
        let runtime = RuntimeBuilder::new().capacity(4).seed(1).build().unwrap();

        assert_eq!(runtime.capacity(), 4);
        assert_eq!(runtime.live_count(), 0);
        assert_eq!(runtime.pending_joins(), 0);
    }
}
