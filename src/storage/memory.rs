//! In-process history store

use super::history::{capacity, History, DEFAULT_MAX_ITEMS};
use super::traits::{HistoryStore, StorageResult};
use crate::record::{Record, RecordPatch};
use std::sync::Mutex;

/// History kept in memory for the lifetime of the process
#[derive(Debug)]
pub struct MemoryStore {
    history: Mutex<History>,
    max_items: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(History::new()),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Set the retention bound; zero or negative keeps nothing.
    pub fn with_max_items(mut self, max_items: i64) -> Self {
        self.max_items = capacity(max_items);
        self
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for MemoryStore {
    fn upsert(&self, record: Record) -> StorageResult<usize> {
        let mut history = self.history.lock().unwrap();
        Ok(history.upsert(record, self.max_items))
    }

    fn patch(&self, key: &str, patch: &RecordPatch) -> StorageResult<bool> {
        let mut history = self.history.lock().unwrap();
        Ok(history.patch(key, patch))
    }

    fn get_all(&self) -> StorageResult<Vec<Record>> {
        let history = self.history.lock().unwrap();
        Ok(history.records().to_vec())
    }

    fn get(&self, key: &str) -> StorageResult<Option<Record>> {
        let history = self.history.lock().unwrap();
        Ok(history.get(key).cloned())
    }

    fn clear(&self) -> StorageResult<()> {
        self.history.lock().unwrap().clear();
        Ok(())
    }

    fn max_items(&self) -> usize {
        self.max_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Kind, Status};

    #[test]
    fn default_store_keeps_latest_only() {
        let store = MemoryStore::new();
        store.upsert(Record::new("a", Kind::Like)).unwrap();
        let size = store.upsert(Record::new("b", Kind::Like)).unwrap();
        assert_eq!(size, 1);
        assert_eq!(store.get_all().unwrap()[0].key, "b");
    }

    #[test]
    fn patch_and_get() {
        let store = MemoryStore::new().with_max_items(5);
        store.upsert(Record::new("a", Kind::Bookmark)).unwrap();

        let found = store
            .patch("a", &RecordPatch::status(Status::Preparing))
            .unwrap();
        assert!(found);
        assert_eq!(store.get("a").unwrap().unwrap().status, Status::Preparing);
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn negative_max_items_never_panics() {
        let store = MemoryStore::new().with_max_items(-1);
        assert_eq!(store.upsert(Record::new("a", Kind::Like)).unwrap(), 0);
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn clear_empties_store() {
        let store = MemoryStore::new().with_max_items(5);
        store.upsert(Record::new("a", Kind::Like)).unwrap();
        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }
}
