//! History storage for captured records
//!
//! Every backend implements `HistoryStore`: a keyed, bounded,
//! most-recent-first collection. `SqliteStore` is the durable backend;
//! `MemoryStore` keeps everything in process.

mod history;
mod memory;
mod sqlite;
mod traits;

pub use history::{capacity, History, DEFAULT_MAX_ITEMS};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{HistoryStore, OpenStore, StorageError, StorageResult};
