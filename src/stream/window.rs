//! The tumbling-window store behind cache coalescing.
//!
//! Recache requests are grouped by resource key; the first dataset seen for
//! a key within a window wins, and later arrivals are dropped. When the
//! window closes, the store is drained and exactly one cache regeneration
//! runs per key, however many mutations arrived in the window.

use crate::core::Dataset;
use std::collections::HashMap;
use std::sync::Mutex;

/// First-value-per-key store for one tumbling window.
pub struct WindowStore {
    entries: Mutex<HashMap<String, Dataset>>,
    capacity: usize,
}

impl WindowStore {
    /// Create a store bounded at `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        WindowStore { entries: Mutex::new(HashMap::new()), capacity }
    }

    /// Offer a keyed dataset. The first value per key is kept; later
    /// offers for the same key are ignored. Returns true when the store
    /// has reached capacity and should be flushed early.
    pub fn offer(&self, key: &str, dataset: Dataset) -> bool {
        let mut entries = self.entries.lock().unwrap();
        entries.entry(key.to_string()).or_insert(dataset);
        entries.len() >= self.capacity
    }

    /// Take every entry out of the store, leaving it empty for the next
    /// window.
    pub fn drain(&self) -> Vec<(String, Dataset)> {
        let mut entries = self.entries.lock().unwrap();
        entries.drain().collect()
    }

    /// Number of keys currently buffered.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when no keys are buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab;
    use crate::core::{Quad, Term};

    fn dataset(title: &str) -> Dataset {
        Dataset::from_quads(vec![Quad::new(
            vocab::trellis::PREFER_USER_MANAGED,
            "info:trellis/repository/a",
            vocab::dc::TITLE,
            Term::literal(title),
        )])
    }

    #[test]
    fn test_first_value_per_key_wins() {
        let store = WindowStore::new(16);
        store.offer("info:trellis/repository/a", dataset("first"));
        store.offer("info:trellis/repository/a", dataset("second"));
        store.offer("info:trellis/repository/a", dataset("third"));

        let drained = store.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].1, dataset("first"));
    }

    #[test]
    fn test_distinct_keys_are_kept() {
        let store = WindowStore::new(16);
        store.offer("info:trellis/repository/a", dataset("a"));
        store.offer("info:trellis/repository/b", dataset("b"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_capacity_signals_early_flush() {
        let store = WindowStore::new(2);
        assert!(!store.offer("info:trellis/repository/a", dataset("a")));
        assert!(store.offer("info:trellis/repository/b", dataset("b")));
    }

    #[test]
    fn test_drain_resets_the_window() {
        let store = WindowStore::new(16);
        store.offer("info:trellis/repository/a", dataset("a"));
        assert_eq!(store.drain().len(), 1);
        assert!(store.is_empty());
        store.offer("info:trellis/repository/a", dataset("again"));
        assert_eq!(store.len(), 1);
    }
}
