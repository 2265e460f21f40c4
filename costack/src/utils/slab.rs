use std::collections::TryReserveError;

/// A slot table with first-fit reuse and generation-checked removal.
///
/// A `Slab` stores values of type `T` in a contiguous array of slots and
/// hands out small, stable indices. Every slot carries a generation counter
/// that is bumped when its value is removed, so a `(key, generation)` pair
/// obtained at insertion stops matching as soon as the slot is reclaimed.
///
/// Internally, it keeps track of:
/// - the slots themselves (occupied or vacant),
/// - the number of occupied slots.
///
/// Vacant slots are found with a linear scan from the front, so the lowest
/// free index is always reused first. When every slot is occupied the table
/// doubles. It never shrinks.
pub(crate) struct Slab<T> {
    /// Slot storage; `entries.len()` is the capacity.
    entries: Vec<Entry<T>>,
    /// Number of occupied slots.
    len: usize,
}

struct Entry<T> {
    value: Option<T>,
    generation: u32,
}

impl<T> Entry<T> {
    fn vacant() -> Self {
        Self {
            value: None,
            generation: 0,
        }
    }
}

impl<T> Slab<T> {
    /// Creates a new `Slab` with `capacity` vacant slots.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if the slots cannot be reserved.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity)?;
        entries.extend((0..capacity).map(|_| Entry::vacant()));

        Ok(Self { entries, len: 0 })
    }

    /// Number of slots, occupied or not.
    pub(crate) fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns the lowest vacant index, growing the table if none is left.
    ///
    /// Growth doubles the capacity (an empty table grows to one slot) and
    /// returns the first new tail slot. Existing slots keep their indices
    /// and contents.
    ///
    /// # Errors
    ///
    /// Returns the allocator's error if growth was needed and failed. The
    /// table is left unchanged in that case.
    pub(crate) fn vacant_key(&mut self) -> Result<usize, TryReserveError> {
        if let Some(key) = self.entries.iter().position(|e| e.value.is_none()) {
            return Ok(key);
        }

        let len = self.entries.len();
        let new_len = if len == 0 { 1 } else { 2 * len };

        self.entries.try_reserve_exact(new_len - len)?;
        self.entries.extend((len..new_len).map(|_| Entry::vacant()));

        Ok(len)
    }

    /// Stores `value` in the vacant slot `key` and returns the slot's
    /// current generation.
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - `key` is out of bounds
    /// - the slot is already occupied
    pub(crate) fn insert_at(&mut self, key: usize, value: T) -> u32 {
        assert!(key < self.entries.len(), "Index out of range");

        let entry = &mut self.entries[key];
        assert!(entry.value.is_none(), "Slot is already occupied");

        entry.value = Some(value);
        self.len += 1;

        entry.generation
    }

    /// Inserts a value into the first vacant slot and returns its key and
    /// generation.
    pub(crate) fn insert(&mut self, value: T) -> Result<(usize, u32), TryReserveError> {
        let key = self.vacant_key()?;
        let generation = self.insert_at(key, value);

        Ok((key, generation))
    }

    /// Returns a reference to the value at `key`, if occupied.
    pub(crate) fn get(&self, key: usize) -> Option<&T> {
        self.entries.get(key).and_then(|e| e.value.as_ref())
    }

    /// Returns a mutable reference to the value at `key`, if occupied.
    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(|e| e.value.as_mut())
    }

    /// Returns the value at `key` only if the slot still holds the
    /// occupant issued with `generation`.
    pub(crate) fn get_checked(&self, key: usize, generation: u32) -> Option<&T> {
        self.entries
            .get(key)
            .filter(|e| e.generation == generation)
            .and_then(|e| e.value.as_ref())
    }

    /// Removes and returns the value at `key` if `generation` matches.
    ///
    /// The slot becomes vacant, its generation is bumped, and it may be
    /// handed out again by [`vacant_key`](Self::vacant_key).
    pub(crate) fn remove(&mut self, key: usize, generation: u32) -> Option<T> {
        let entry = self.entries.get_mut(key)?;

        if entry.generation != generation {
            return None;
        }

        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.len -= 1;

        Some(value)
    }

    /// Iterates over occupied slots in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(key, e)| e.value.as_ref().map(|v| (key, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::Slab;

    #[test]
    fn reuses_lowest_vacant_slot() {
        let mut slab = Slab::with_capacity(4).unwrap();

        let (a, ga) = slab.insert("a").unwrap();
        let (b, _) = slab.insert("b").unwrap();
        let (c, _) = slab.insert("c").unwrap();
        assert_eq!((a, b, c), (0, 1, 2));

        assert_eq!(slab.remove(a, ga), Some("a"));
        assert_eq!(slab.vacant_key().unwrap(), 0);

        let (d, gd) = slab.insert("d").unwrap();
        assert_eq!(d, 0);
        assert_ne!(gd, ga);
        assert_eq!(slab.len(), 3);
    }

    #[test]
    fn doubles_when_full_and_keeps_contents() {
        let mut slab = Slab::with_capacity(2).unwrap();
        slab.insert(10).unwrap();
        slab.insert(20).unwrap();
        assert_eq!(slab.capacity(), 2);

        let (key, _) = slab.insert(30).unwrap();
        assert_eq!(key, 2);
        assert_eq!(slab.capacity(), 4);
        assert_eq!(slab.get(0), Some(&10));
        assert_eq!(slab.get(1), Some(&20));
        assert_eq!(slab.get(2), Some(&30));
        assert_eq!(slab.get(3), None);
    }

    #[test]
    fn empty_table_grows_to_one_slot() {
        let mut slab = Slab::<u8>::with_capacity(0).unwrap();
        assert_eq!(slab.vacant_key().unwrap(), 0);
        assert_eq!(slab.capacity(), 1);
    }

    #[test]
    fn stale_generation_is_rejected() {
        let mut slab = Slab::with_capacity(1).unwrap();
        let (key, generation) = slab.insert(1).unwrap();

        assert_eq!(slab.remove(key, generation), Some(1));
        assert_eq!(slab.remove(key, generation), None);

        let (again, fresh) = slab.insert(2).unwrap();
        assert_eq!(again, key);
        assert!(slab.get_checked(key, generation).is_none());
        assert_eq!(slab.get_checked(key, fresh), Some(&2));
        assert_eq!(slab.remove(key, generation), None);
        assert_eq!(slab.get(key), Some(&2));
    }

    #[test]
    fn iter_skips_vacant_slots() {
        let mut slab = Slab::with_capacity(4).unwrap();
        slab.insert('x').unwrap();
        let (y, gy) = slab.insert('y').unwrap();
        slab.insert('z').unwrap();
        slab.remove(y, gy);

        let seen: Vec<_> = slab.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(seen, vec![(0, 'x'), (2, 'z')]);
    }
}
