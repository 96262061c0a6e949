//! Shared fixtures for the pipeline and store integration tests
//!
//! Fetchers here never touch the network: each one replays a fixed
//! outcome and counts how often it was asked.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use xliker::{
    Article, ArticleFetcher, FallbackFetcher, FetchError, HistoryStore, MemoryStore,
    MockSummarizer, Pipeline, Record, RecordPatch, Status, StorageResult,
};

/// Fetcher that replays one outcome for every URL
pub struct ScriptedFetcher {
    name: &'static str,
    outcome: Result<Article, u16>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    /// Succeeds with an article whose resolved URL is the requested one.
    pub fn serving(title: &str, excerpt: &str) -> Arc<Self> {
        Arc::new(Self {
            name: "scripted",
            outcome: Ok(Article {
                title: title.to_string(),
                description: format!("about {}", title),
                excerpt: excerpt.to_string(),
                content_type: "text/html".to_string(),
                ..Default::default()
            }),
            calls: AtomicUsize::new(0),
        })
    }

    /// Fails every fetch with the given HTTP status.
    pub fn failing(name: &'static str, status: u16) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(article) => Ok(Article {
                resolved_url: url.to_string(),
                ..article.clone()
            }),
            Err(status) => Err(FetchError::Status(*status)),
        }
    }
}

/// Pipeline wired to an in-memory store
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub summarizer: Arc<MockSummarizer>,
    pub pipeline: Arc<Pipeline>,
}

impl Harness {
    pub fn new(fetcher: Arc<dyn ArticleFetcher>, summarizer: MockSummarizer) -> Self {
        Self::with_max_items(fetcher, summarizer, 20)
    }

    pub fn with_max_items(
        fetcher: Arc<dyn ArticleFetcher>,
        summarizer: MockSummarizer,
        max_items: i64,
    ) -> Self {
        let store = Arc::new(MemoryStore::new().with_max_items(max_items));
        let summarizer = Arc::new(summarizer);
        let pipeline = Arc::new(
            Pipeline::new(store.clone(), fetcher, summarizer.clone()).with_language("en"),
        );
        Self {
            store,
            summarizer,
            pipeline,
        }
    }
}

/// Primary and fallback that both fail, with handles to their counters.
pub fn broken_fetchers() -> (Arc<ScriptedFetcher>, Arc<ScriptedFetcher>, Arc<FallbackFetcher>) {
    let primary = ScriptedFetcher::failing("http", 503);
    let fallback = ScriptedFetcher::failing("render", 500);
    let combined = Arc::new(FallbackFetcher::new(primary.clone(), fallback.clone()));
    (primary, fallback, combined)
}

/// Store wrapper that remembers every status written per key
pub struct RecordingStore {
    inner: MemoryStore,
    statuses: Mutex<Vec<(String, Status)>>,
}

impl RecordingStore {
    pub fn new(max_items: i64) -> Self {
        Self {
            inner: MemoryStore::new().with_max_items(max_items),
            statuses: Mutex::new(Vec::new()),
        }
    }

    /// Statuses written for `key`, in order, starting with the upserted one.
    pub fn statuses(&self, key: &str) -> Vec<Status> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl HistoryStore for RecordingStore {
    fn upsert(&self, record: Record) -> StorageResult<usize> {
        self.statuses
            .lock()
            .unwrap()
            .push((record.key.clone(), record.status));
        self.inner.upsert(record)
    }

    fn patch(&self, key: &str, patch: &RecordPatch) -> StorageResult<bool> {
        if let Some(status) = patch.status {
            self.statuses.lock().unwrap().push((key.to_string(), status));
        }
        self.inner.patch(key, patch)
    }

    fn get_all(&self) -> StorageResult<Vec<Record>> {
        self.inner.get_all()
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }

    fn max_items(&self) -> usize {
        self.inner.max_items()
    }
}
