//! SQLite storage backend
//!
//! The history is one JSON document in a key-value slot table. Every
//! mutation rewrites the whole document inside a transaction; every query
//! re-reads it. There is no partial-write or partial-read guarantee
//! beyond whole-collection replace.

use super::history::{capacity, History, DEFAULT_MAX_ITEMS};
use super::traits::{HistoryStore, OpenStore, StorageResult};
use crate::record::{Record, RecordPatch};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

/// Slot holding the record history
const HISTORY_SLOT: &str = "history";

/// SQLite-backed history store
///
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_items: usize,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_slots (
                slot TEXT PRIMARY KEY,
                value_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_items: DEFAULT_MAX_ITEMS,
        })
    }

    /// Set the retention bound; zero or negative keeps nothing.
    pub fn with_max_items(mut self, max_items: i64) -> Self {
        self.max_items = capacity(max_items);
        self
    }

    /// Read the history slot. A missing slot is an empty history; so is a
    /// value that does not parse as a record list.
    fn read_history(conn: &Connection) -> StorageResult<History> {
        let raw: Option<String> = conn
            .query_row(
                "SELECT value_json FROM kv_slots WHERE slot = ?1",
                params![HISTORY_SLOT],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(History::new());
        };

        match serde_json::from_str::<History>(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!(error = %e, "history slot is not a record list; treating as empty");
                Ok(History::new())
            }
        }
    }

    fn write_history(conn: &Connection, history: &History) -> StorageResult<()> {
        let json = serde_json::to_string(history)?;
        conn.execute(
            r#"
            INSERT INTO kv_slots (slot, value_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(slot) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at
            "#,
            params![HISTORY_SLOT, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Run one read-modify-write over the history in a transaction.
    fn mutate<T>(&self, f: impl FnOnce(&mut History) -> T) -> StorageResult<T> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut history = Self::read_history(&tx)?;
        let out = f(&mut history);
        Self::write_history(&tx, &history)?;
        tx.commit()?;
        Ok(out)
    }

    fn snapshot(&self) -> StorageResult<History> {
        let conn = self.conn.lock().unwrap();
        Self::read_history(&conn)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl HistoryStore for SqliteStore {
    fn upsert(&self, record: Record) -> StorageResult<usize> {
        let max_items = self.max_items;
        self.mutate(|history| history.upsert(record, max_items))
    }

    fn patch(&self, key: &str, patch: &RecordPatch) -> StorageResult<bool> {
        // Skip the write entirely when the key is gone.
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut history = Self::read_history(&tx)?;
        if !history.patch(key, patch) {
            return Ok(false);
        }
        Self::write_history(&tx, &history)?;
        tx.commit()?;
        Ok(true)
    }

    fn get_all(&self) -> StorageResult<Vec<Record>> {
        Ok(self.snapshot()?.into_records())
    }

    fn get(&self, key: &str) -> StorageResult<Option<Record>> {
        Ok(self.snapshot()?.get(key).cloned())
    }

    fn clear(&self) -> StorageResult<()> {
        self.mutate(|history| history.clear())
    }

    fn max_items(&self) -> usize {
        self.max_items
    }
}
