//! Bounded, keyed, most-recent-first record collection
//!
//! The pure collection logic shared by every backend. Backends load a
//! `History`, run one operation on it, and write it back.

use crate::record::{Record, RecordPatch};
use serde::{Deserialize, Serialize};

/// Default number of records kept (only the latest capture).
pub const DEFAULT_MAX_ITEMS: usize = 1;

/// Convert a configured size into a capacity; zero or negative means zero.
pub fn capacity(max_items: i64) -> usize {
    usize::try_from(max_items).unwrap_or(0)
}

/// Ordered records, unique by key, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<Record>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front, dropping any same-key record, then evict
    /// from the tail down to `max_items`. Returns the resulting size.
    pub fn upsert(&mut self, record: Record, max_items: usize) -> usize {
        self.records.retain(|r| r.key != record.key);
        self.records.insert(0, record);
        self.records.truncate(max_items);
        self.records.len()
    }

    /// Shallow-merge `patch` into the record with `key`; `false` if absent.
    pub fn patch(&mut self, key: &str, patch: &RecordPatch) -> bool {
        match self.records.iter_mut().find(|r| r.key == key) {
            Some(record) => {
                record.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Kind, Status};

    fn rec(key: &str) -> Record {
        Record::new(key, Kind::Like)
    }

    fn keys(history: &History) -> Vec<&str> {
        history.records().iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn upsert_inserts_at_front() {
        let mut history = History::new();
        history.upsert(rec("a"), 10);
        history.upsert(rec("b"), 10);
        assert_eq!(keys(&history), vec!["b", "a"]);
    }

    #[test]
    fn upsert_replaces_same_key_and_moves_it_to_front() {
        let mut history = History::new();
        history.upsert(rec("a"), 10);
        history.upsert(rec("b"), 10);

        let replacement = rec("a").with_primary_text("second");
        let size = history.upsert(replacement.clone(), 10);

        assert_eq!(size, 2);
        assert_eq!(keys(&history), vec!["a", "b"]);
        assert_eq!(history.get("a"), Some(&replacement));
    }

    #[test]
    fn eviction_drops_oldest_first() {
        let mut history = History::new();
        for key in ["A", "B", "C"] {
            history.upsert(rec(key), 2);
        }
        assert_eq!(keys(&history), vec!["C", "B"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = History::new();
        assert_eq!(history.upsert(rec("a"), 0), 0);
        assert!(history.is_empty());
    }

    #[test]
    fn negative_capacity_is_zero() {
        assert_eq!(capacity(-5), 0);
        assert_eq!(capacity(0), 0);
        assert_eq!(capacity(3), 3);
    }

    #[test]
    fn patch_keeps_position() {
        let mut history = History::new();
        history.upsert(rec("a"), 10);
        history.upsert(rec("b"), 10);

        assert!(history.patch("a", &RecordPatch::status(Status::Done)));
        assert_eq!(keys(&history), vec!["b", "a"]);
        assert_eq!(history.get("a").map(|r| r.status), Some(Status::Done));
    }

    #[test]
    fn patch_missing_key_is_noop() {
        let mut history = History::new();
        history.upsert(rec("a"), 10);
        let before = history.clone();

        assert!(!history.patch("zzz", &RecordPatch::status(Status::Done)));
        assert_eq!(history, before);
    }

    #[test]
    fn empty_keys_collapse() {
        let mut history = History::new();
        history.upsert(rec(""), 10);
        history.upsert(rec(""), 10);
        assert_eq!(history.len(), 1);
    }
}
