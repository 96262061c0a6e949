//! Captured records and their status lifecycle

mod lifecycle;
mod types;

pub use lifecycle::{LifecycleError, LifecycleEvent, Status};
pub use types::{Article, Kind, Record, RecordId, RecordPatch};
