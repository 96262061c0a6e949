//! Storage trait definitions

use crate::record::{Record, RecordPatch};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for history storage backends
///
/// Each operation is one atomic read-modify-write over the whole
/// collection. Operations are not isolated from each other across calls:
/// callers that need several steps on the same key must await each step
/// before issuing the next.
///
/// Implementations must be thread-safe (Send + Sync) so one store can be
/// shared by every in-flight pipeline.
pub trait HistoryStore: Send + Sync {
    /// Insert a record at the front, replacing any record with the same key.
    ///
    /// Evicts the oldest records beyond `max_items()` and returns the
    /// resulting number of records.
    fn upsert(&self, record: Record) -> StorageResult<usize>;

    /// Merge the patch into the record with `key`, keeping its position.
    ///
    /// Returns `false` (and changes nothing) when no such record exists.
    fn patch(&self, key: &str, patch: &RecordPatch) -> StorageResult<bool>;

    /// All records, most recent first
    fn get_all(&self) -> StorageResult<Vec<Record>>;

    /// Look up one record by key
    fn get(&self, key: &str) -> StorageResult<Option<Record>> {
        Ok(self.get_all()?.into_iter().find(|r| r.key == key))
    }

    /// Remove every record
    fn clear(&self) -> StorageResult<()>;

    /// Maximum number of records retained
    fn max_items(&self) -> usize;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: HistoryStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
