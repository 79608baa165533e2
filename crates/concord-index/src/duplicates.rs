//! Detection of keys seen more than once in one source.

use std::collections::HashMap;

use crate::key::{Key, RowKey};

/// Remembers the first row seen for each key.
///
/// Only the first occurrence is remembered; every later row agreeing with it
/// is reported as a duplicate of that first row.
#[derive(Debug, Default)]
pub struct DuplicateTracker {
    seen: HashMap<Key, Vec<(RowKey, String)>>,
}

impl DuplicateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a row. Returns the name of the earlier row with the same key,
    /// if there is one.
    pub fn observe(&mut self, key: &RowKey, name: impl Into<String>) -> Option<String> {
        let bucket = self.seen.entry(key.primary().clone()).or_default();
        if let Some((_, original)) = bucket.iter().find(|(k, _)| k.agrees(key)) {
            return Some(original.clone());
        }
        bucket.push((key.clone(), name.into()));
        None
    }

    /// Number of distinct keys seen.
    pub fn distinct(&self) -> usize {
        self.seen.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySpec;

    #[test]
    fn flags_only_repeats() {
        let spec = KeySpec::text(["Id"]);
        let mut tracker = DuplicateTracker::new();
        let flags: Vec<_> = ["A", "B", "A"]
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let key = spec.key_of(|_| Some(*id)).unwrap();
                tracker.observe(&key, format!("Row #{}", i + 1))
            })
            .collect();
        assert_eq!(flags, vec![None, None, Some("Row #1".to_string())]);
        assert_eq!(tracker.distinct(), 2);
    }
}
