//! Direct-mapped computed tables.
//!
//! One generic fixed-size cache type backs both memo tables of the engine:
//! edge operations keyed `(e0, e1, op)` and weight operations keyed
//! `(w0, w1, op)`. Both are pure functions of their keys, so a colliding
//! insert may simply evict: a later miss recomputes the same result.

use std::cell::Cell;

use crate::utils::MyHash;

pub struct OpCache<K, V> {
    data: Box<[Option<(K, V)>]>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> OpCache<K, V> {
    /// Create a cache with `2^bits` direct-mapped slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits should be in the range 0..=31");

        let size = 1 << bits;
        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Number of lookups that returned a cached result.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    /// Number of lookups that found nothing (or an evicted slot).
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Drop every entry. Purely a memory/diagnostic operation; results of
    /// subsequent lookups are unaffected.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|slot| *slot = None);
    }
}

impl<K, V> OpCache<K, V>
where
    K: MyHash + Eq,
    V: Copy,
{
    fn slot(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    pub fn get(&self, key: &K) -> Option<V> {
        match &self.data[self.slot(key)] {
            Some((k, v)) if k == key => {
                self.hits.set(self.hits.get() + 1);
                Some(*v)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Store a result, evicting whatever occupied the slot.
    pub fn insert(&mut self, key: K, value: V) {
        let slot = self.slot(&key);
        self.data[slot] = Some((key, value));
    }
}
