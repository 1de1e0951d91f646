//! Bounded keyed cache with insertion-order eviction.
//!
//! Capacity is enforced by a ring of key slots and a cursor: inserting a new
//! key overwrites the slot at the cursor, removing whatever key occupied it
//! from the map. Replacing the value of a live key does not touch the ring,
//! and removing an entry leaves its slot occupied, so eviction strictly
//! follows insertion order rather than read recency.

use std::collections::HashMap;
use std::hash::Hash;

/// Fixed-capacity map evicting the oldest-inserted entry when full.
#[derive(Debug)]
pub struct FixedCache<K, V> {
    map: HashMap<K, V>,
    slots: Vec<Option<K>>,
    cursor: usize,
}

impl<K, V> FixedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            map: HashMap::with_capacity(capacity),
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    /// Insert or replace an entry, returning the previous value for the key.
    ///
    /// A new key claims the slot at the cursor, evicting the slot's current
    /// occupant from the map; an existing key only swaps its value.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        if self.map.contains_key(&key) {
            return self.map.insert(key, value);
        }
        if let Some(evicted) = self.slots[self.cursor].take() {
            self.map.remove(&evicted);
        }
        self.slots[self.cursor] = Some(key.clone());
        self.cursor = (self.cursor + 1) % self.slots.len();
        self.map.insert(key, value)
    }

    /// Remove an entry, returning its value. The key's slot stays occupied.
    pub fn pull(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
