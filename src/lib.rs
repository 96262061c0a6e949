//! xliker: capture, enrich and summarize liked or bookmarked posts
//!
//! A liked post is enriched with the article it links to and condensed
//! into an outline by a hosted language model. A bookmarked post keeps
//! its raw text for export. Results live in a bounded local history.
//!
//! # Core Concepts
//!
//! - **Records**: one per post, unique by permalink, with a status lifecycle
//! - **History store**: keyed, bounded, most-recent-first persistence
//! - **Pipeline**: the steps applied to one record after it is captured
//!
//! # Example
//!
//! ```
//! use xliker::{HistoryStore, Kind, MemoryStore, Record};
//!
//! let store = MemoryStore::new().with_max_items(2);
//! for key in ["a", "b", "c"] {
//!     store.upsert(Record::new(key, Kind::Bookmark)).unwrap();
//! }
//! let keys: Vec<_> = store.get_all().unwrap().into_iter().map(|r| r.key).collect();
//! assert_eq!(keys, ["c", "b"]);
//! ```

pub mod article;
pub mod config;
pub mod export;
pub mod pipeline;
mod record;
pub mod scrape;
pub mod storage;
pub mod summarize;

pub use article::{
    ArticleFetcher, FallbackFetcher, FetchError, HttpFetcher, RenderFetcher, UrlResolver,
};
pub use config::{ConfigError, Settings};
pub use pipeline::{Ack, CaptureEvent, DispatchReport, Dispatcher, Job, Pipeline, PipelineError};
pub use record::{
    Article, Kind, LifecycleError, LifecycleEvent, Record, RecordId, RecordPatch, Status,
};
pub use scrape::{ScrapedPost, Scraper, TimelineScraper};
pub use storage::{HistoryStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use summarize::{ChatSummarizer, MockSummarizer, Provider, SummarizeError, Summarizer, SummaryRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
