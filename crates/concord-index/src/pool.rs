//! Arena of candidates that are marked consumed instead of removed.
//!
//! Used where matching needs a predicate rather than a hash lookup, e.g.
//! sub-messages whose expected key fields may hold expressions.

/// Candidates borrowed from a slice, each consumed at most once.
#[derive(Debug)]
pub struct CandidatePool<'a, T> {
    items: &'a [T],
    consumed: Vec<bool>,
}

impl<'a, T> CandidatePool<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self {
            items,
            consumed: vec![false; items.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.get(index).copied().unwrap_or(true)
    }

    /// Consume and return the first free candidate accepted by `accept`.
    pub fn take_first<F>(&mut self, mut accept: F) -> Option<(usize, &'a T)>
    where
        F: FnMut(&T) -> bool,
    {
        let items = self.items;
        let index = (0..items.len()).find(|&i| !self.consumed[i] && accept(&items[i]))?;
        self.consumed[index] = true;
        Some((index, &items[index]))
    }

    /// Free candidates in their original order.
    pub fn remaining(&self) -> impl Iterator<Item = (usize, &'a T)> + '_ {
        let items = self.items;
        self.consumed
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(move |(i, _)| (i, &items[i]))
    }
}
