use super::coroutine::{Coroutine, CoroutineId, Entry, Status};
use super::stack::Stack;
use super::trampoline::trampoline;
use crate::error::{Error, Result};
use crate::utils::Slab;

/// Table of coroutine descriptors indexed by slot id.
///
/// The registry owns:
/// - every descriptor and, through it, every coroutine stack,
/// - the slot allocation policy (first-fit, doubling growth),
/// - the identity of the coroutine currently executing.
///
/// Slot 0 always holds the main pseudo-coroutine. A slot is reused only
/// after its previous occupant has been reclaimed, which requires it to be
/// `Dead` and joined.
pub(crate) struct Registry {
    slots: Slab<Box<Coroutine>>,
    /// Non-main coroutines that have not reached `Dead`.
    live: usize,
    current: CoroutineId,
}

impl Registry {
    /// Creates a registry with `capacity` slots and installs the main
    /// pseudo-coroutine at slot 0 as the running coroutine.
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        let mut slots = Slab::with_capacity(capacity)
            .map_err(|_| Error::RegistryGrowth { requested: capacity })?;

        let (key, _) = slots
            .insert(Coroutine::main())
            .map_err(|_| Error::RegistryGrowth { requested: 1 })?;
        debug_assert_eq!(key, CoroutineId::MAIN.0);

        Ok(Self {
            slots,
            live: 0,
            current: CoroutineId::MAIN,
        })
    }

    /// Allocates a slot, a zeroed stack and a fresh context for `entry`.
    ///
    /// The new coroutine is `Suspended`; its first resume enters the
    /// trampoline, and when its entry returns control flows to main.
    pub(crate) fn spawn(
        &mut self,
        name: &str,
        entry: Entry,
        stack_size: usize,
    ) -> Result<(CoroutineId, u32)> {
        let stack = Stack::new(stack_size)?;

        let capacity = self.slots.capacity();
        let key = self
            .slots
            .vacant_key()
            .map_err(|_| Error::RegistryGrowth {
                requested: (2 * capacity).max(1),
            })?;

        let slot = libc::c_int::try_from(key).map_err(|_| Error::RegistryGrowth {
            requested: key + 1,
        })?;

        let id = CoroutineId(key);
        let link = self.descriptor(CoroutineId::MAIN).context.as_ptr();
        let mut coroutine = Coroutine::new(id, name, stack, entry);

        // Safety: the descriptor is boxed and owns its stack; main's
        // descriptor never leaves slot 0 while the registry lives.
        unsafe { coroutine.prepare(link, trampoline, slot)? };

        let generation = self.slots.insert_at(key, coroutine);
        self.live += 1;

        trace!("spawn {} slot={} gen={}", name, key, generation);

        Ok((id, generation))
    }

    /// Makes `next` the running coroutine.
    ///
    /// The previously running coroutine is marked `Suspended` unless it has
    /// already terminated. Calling this for the current coroutine is a
    /// no-op.
    pub(crate) fn activate(&mut self, next: CoroutineId) {
        let prev = self.current;

        if prev != next {
            if let Some(co) = self.slots.get_mut(prev.0) {
                if co.status == Status::Running {
                    co.status = Status::Suspended;
                }
            }
        }

        if let Some(co) = self.slots.get_mut(next.0) {
            co.status = Status::Running;
        }

        self.current = next;
    }

    /// Marks `id` as terminated and hands the CPU back to main.
    pub(crate) fn finish(&mut self, id: CoroutineId, panicked: bool) {
        if let Some(co) = self.slots.get_mut(id.0) {
            co.status = Status::Dead;
            co.panicked = panicked;
            self.live -= 1;
        }

        self.activate(CoroutineId::MAIN);
    }

    /// Takes the entry body of `id`, leaving `None` behind.
    pub(crate) fn take_entry(&mut self, id: CoroutineId) -> Option<Entry> {
        self.slots.get_mut(id.0).and_then(|co| co.entry.take())
    }

    /// Status of the occupant issued with `generation`, if still present.
    pub(crate) fn status(&self, id: CoroutineId, generation: u32) -> Option<Status> {
        self.slots
            .get_checked(id.0, generation)
            .map(|co| co.status)
    }

    /// Removes a terminated coroutine, freeing its stack and slot.
    ///
    /// Returns `None` when the handle is stale or the occupant is not yet
    /// `Dead`.
    pub(crate) fn reclaim(&mut self, id: CoroutineId, generation: u32) -> Option<Box<Coroutine>> {
        if id == CoroutineId::MAIN || self.status(id, generation)? != Status::Dead {
            return None;
        }

        let coroutine = self.slots.remove(id.0, generation)?;
        trace!("reclaim {} slot={}", coroutine.name, id.0);

        Some(coroutine)
    }

    /// Number of coroutines eligible for selection.
    pub(crate) fn runnable_count(&self) -> usize {
        self.runnable().count()
    }

    /// The `n`-th runnable coroutine in slot order.
    pub(crate) fn nth_runnable(&self, n: usize) -> Option<CoroutineId> {
        self.runnable().nth(n)
    }

    fn runnable(&self) -> impl Iterator<Item = CoroutineId> + '_ {
        self.slots
            .iter()
            .filter(|(_, co)| co.is_runnable())
            .map(|(key, _)| CoroutineId(key))
    }

    /// Context pointer of `id`, stable for as long as the slot is occupied.
    pub(crate) fn context_ptr(&self, id: CoroutineId) -> *mut libc::ucontext_t {
        self.descriptor(id).context.as_ptr()
    }

    pub(crate) fn name(&self, id: CoroutineId) -> &str {
        self.slots.get(id.0).map_or("?", |co| co.name.as_str())
    }

    pub(crate) fn current(&self) -> CoroutineId {
        self.current
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of occupied slots, main included.
    pub(crate) fn occupied(&self) -> usize {
        self.slots.len()
    }

    /// # Panics
    ///
    /// Panics if the slot is vacant. Callers only pass ids the scheduler
    /// selected or main's id, which are always occupied.
    fn descriptor(&self, id: CoroutineId) -> &Coroutine {
        match self.slots.get(id.0) {
            Some(co) => co,
            None => panic!("coroutine slot {} is vacant", id.0),
        }
    }
}
