//! Removal-on-match index of candidates by key.
//!
//! Candidates sharing a key are kept in source order. A lookup consumes the
//! first candidate whose key agrees with the lookup key, so several lookups
//! with the same key claim the candidates one by one. This is first-match
//! pairing, not a minimal multiset matching.

use std::collections::HashMap;

use crate::key::{Key, RowKey};

/// Index of candidates (rows, messages) by [`RowKey`].
#[derive(Debug)]
pub struct KeyIndex<T> {
    buckets: HashMap<Key, Vec<usize>>,
    slots: Vec<Option<(RowKey, T)>>,
    live: usize,
}

impl<T> Default for KeyIndex<T> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<T> KeyIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of candidates not yet taken.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn insert(&mut self, key: RowKey, item: T) {
        let slot = self.slots.len();
        self.buckets
            .entry(key.primary().clone())
            .or_default()
            .push(slot);
        self.slots.push(Some((key, item)));
        self.live += 1;
    }

    /// Remove and return the first candidate whose key agrees with `key`.
    pub fn take_match(&mut self, key: &RowKey) -> Option<(RowKey, T)> {
        let bucket = self.buckets.get_mut(key.primary())?;
        let slots = &self.slots;
        let position = bucket.iter().position(|&slot| {
            slots[slot]
                .as_ref()
                .is_some_and(|(candidate, _)| candidate.agrees(key))
        })?;
        let slot = bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(key.primary());
        }
        self.live -= 1;
        self.slots[slot].take()
    }

    /// Consume the index, yielding the candidates nobody took in insertion
    /// order.
    pub fn into_remaining(self) -> impl Iterator<Item = (RowKey, T)> {
        self.slots.into_iter().flatten()
    }
}
