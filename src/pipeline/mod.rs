//! Capture pipeline
//!
//! Single entry point per user action: `capture(event)` records the
//! observation, then drives the record to `done` or `error`.
//!
//! Like:     queued → fetching → summarizing → done | error
//! Bookmark: queued → preparing → done
//!
//! A user may later call `fetch_article_for(key)` on a finished record
//! (`done → fetching-article → done`).
//!
//! Every step is a keyed patch on the shared store, awaited before the
//! next one starts, so one pipeline never races itself. Failures inside
//! a pipeline end up in the record's `error_message`; only storage
//! failures, which cannot be recorded, are returned to the caller.

mod dispatch;
mod event;

pub use dispatch::{Ack, DispatchReport, Dispatcher, Job};
pub use event::CaptureEvent;

use crate::article::{truncate_chars, ArticleFetcher, FetchError};
use crate::export::{build_export_text, download_name, ExportParts};
use crate::record::{
    Article, Kind, LifecycleError, LifecycleEvent, Record, RecordPatch, Status,
};
use crate::storage::{HistoryStore, StorageError};
use crate::summarize::{SummarizeError, Summarizer, SummaryRequest, ERROR_BODY_CHARS};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Message recorded when a deferred fetch has nothing to fetch
pub const NO_EXTERNAL_LINK: &str = "No external link found";

/// Errors surfaced by pipelines
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing {0} API key. Set it in the config file or environment.")]
    MissingCredential(String),

    #[error("{label} error {status}: {body}")]
    Provider {
        label: String,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("no post found on page")]
    ScrapeUnavailable,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<SummarizeError> for PipelineError {
    fn from(e: SummarizeError) -> Self {
        match e {
            SummarizeError::MissingCredential(label) => PipelineError::MissingCredential(label),
            SummarizeError::Provider {
                label,
                status,
                body,
            } => PipelineError::Provider {
                label,
                status,
                body,
            },
            SummarizeError::Network(msg) => PipelineError::Network(msg),
            SummarizeError::Parse(msg) => PipelineError::InvalidResponse(msg),
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        PipelineError::Network(e.to_string())
    }
}

impl PipelineError {
    /// Message as shown to the user in the record
    pub fn user_message(&self) -> String {
        truncate_chars(&self.to_string(), ERROR_BODY_CHARS)
    }
}

/// Tracks one record's status as its pipeline advances.
struct Run<'a> {
    store: &'a dyn HistoryStore,
    key: String,
    status: Status,
}

impl<'a> Run<'a> {
    fn new(store: &'a dyn HistoryStore, key: &str, status: Status) -> Self {
        Self {
            store,
            key: key.to_string(),
            status,
        }
    }

    /// Apply a lifecycle event and write the new status with `patch`.
    fn advance(&mut self, event: LifecycleEvent, patch: RecordPatch) -> Result<(), PipelineError> {
        let next = self.status.apply(event)?;
        let found = self.store.patch(&self.key, &patch.with_status(next))?;
        if !found {
            // Evicted mid-flight; later patches are no-ops as well.
            warn!(key = %self.key, status = %next, "record no longer in history");
        }
        self.status = next;
        Ok(())
    }

    fn fail(&mut self, error: &PipelineError) -> Result<(), PipelineError> {
        self.advance(
            LifecycleEvent::Failed,
            RecordPatch::new().with_error(error.user_message()),
        )
    }
}

/// The capture pipeline and its collaborators
pub struct Pipeline {
    store: Arc<dyn HistoryStore>,
    fetcher: Arc<dyn ArticleFetcher>,
    summarizer: Arc<dyn Summarizer>,
    language: String,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        fetcher: Arc<dyn ArticleFetcher>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            language: "zh-CN".to_string(),
        }
    }

    /// Set the summary output language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// Record a new observation. Returns the queued record and the history
    /// size after the upsert.
    pub fn observe(&self, event: &CaptureEvent) -> Result<(Record, usize), PipelineError> {
        let record = event.to_record();
        let size = self.store.upsert(record.clone())?;
        info!(key = %record.key, kind = %record.kind, size, "captured");
        Ok((record, size))
    }

    /// Observe the event and drive the record to a terminal state.
    pub async fn capture(&self, event: CaptureEvent) -> Result<Status, PipelineError> {
        let (record, _) = self.observe(&event)?;
        self.process(&record).await
    }

    /// Drive a queued record to `done` or `error`. Returns the final status.
    pub async fn process(&self, record: &Record) -> Result<Status, PipelineError> {
        let mut run = Run::new(self.store.as_ref(), &record.key, record.status);
        let result = match record.kind {
            Kind::Like => self.run_like(&mut run, record).await,
            Kind::Bookmark => self.run_bookmark(&mut run, record),
        };

        match result {
            Ok(()) => Ok(run.status),
            Err(e) => {
                if !run.status.is_terminal() && !matches!(e, PipelineError::Storage(_)) {
                    if let Err(record_err) = run.fail(&e) {
                        warn!(key = %record.key, error = %record_err, "could not record failure");
                    }
                }
                Err(e)
            }
        }
    }

    /// Fetch the first link, degrading to `None` when every strategy fails.
    async fn enrich(&self, url: &str) -> Option<Article> {
        match self.fetcher.fetch(url).await {
            Ok(article) => Some(article),
            Err(e) => {
                warn!(url, error = %e, "article unavailable; continuing without it");
                None
            }
        }
    }

    async fn run_like(&self, run: &mut Run<'_>, record: &Record) -> Result<(), PipelineError> {
        run.advance(LifecycleEvent::BeginFetch, RecordPatch::new())?;

        let article = match record.first_link() {
            Some(link) => self.enrich(link).await,
            None => None,
        };
        run.advance(
            LifecycleEvent::FetchComplete,
            RecordPatch::new().with_enrichment(article.clone()),
        )?;

        let request = SummaryRequest {
            language: self.language.clone(),
            primary_text: record.primary_text.clone(),
            thread_texts: record.thread_texts.clone(),
            article: article.clone(),
        };

        match self.summarizer.summarize(&request).await {
            Ok(summary) => {
                let parts = ExportParts::from_record(record).with_article(article.as_ref());
                let raw_text = build_export_text(&ExportParts {
                    summary: Some(&summary),
                    ..parts
                });
                let name = download_name(&title_hint(article.as_ref(), record));
                run.advance(
                    LifecycleEvent::SummaryComplete,
                    RecordPatch::new()
                        .with_summary(summary.as_str())
                        .with_raw_text(raw_text)
                        .with_download_name(name),
                )?;
                info!(key = %record.key, "summarized");
            }
            Err(e) => {
                let error = PipelineError::from(e);
                warn!(key = %record.key, error = %error, "summary failed");
                run.advance(
                    LifecycleEvent::SummaryFailed,
                    RecordPatch::new().with_error(error.user_message()),
                )?;
            }
        }
        Ok(())
    }

    fn run_bookmark(&self, run: &mut Run<'_>, record: &Record) -> Result<(), PipelineError> {
        run.advance(LifecycleEvent::BeginAssembly, RecordPatch::new())?;

        let raw_text = build_export_text(&ExportParts::from_record(record).with_article(None));
        let name = download_name(&record.primary_text);
        run.advance(
            LifecycleEvent::AssemblyComplete,
            RecordPatch::new()
                .with_raw_text(raw_text)
                .with_download_name(name),
        )?;
        info!(key = %record.key, "bookmark text saved");
        Ok(())
    }

    /// User-triggered fetch of a finished record's first external link.
    ///
    /// Rebuilds the assembled text with the article. Returns the final
    /// status, which is always `done` on success.
    pub async fn fetch_article_for(&self, key: &str) -> Result<Status, PipelineError> {
        let record = self
            .store
            .get(key)?
            .ok_or_else(|| PipelineError::NotFound(key.to_string()))?;

        let mut run = Run::new(self.store.as_ref(), key, record.status);
        if !record.status.can_apply(LifecycleEvent::DeferredFetchRequested) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                event: LifecycleEvent::DeferredFetchRequested,
            }
            .into());
        }

        let Some(link) = record.first_link() else {
            self.store
                .patch(key, &RecordPatch::new().with_error(NO_EXTERNAL_LINK))?;
            return Ok(record.status);
        };

        run.advance(
            LifecycleEvent::DeferredFetchRequested,
            RecordPatch::new().clear_error(),
        )?;

        match self.fetcher.fetch(link).await {
            Ok(article) => {
                let raw_text =
                    build_export_text(&ExportParts::from_record(&record).with_article(Some(&article)));
                let name = download_name(&title_hint(Some(&article), &record));
                run.advance(
                    LifecycleEvent::DeferredFetchComplete,
                    RecordPatch::new()
                        .with_enrichment(Some(article))
                        .with_raw_text(raw_text)
                        .with_download_name(name),
                )?;
                info!(key, "article attached");
            }
            Err(e) => {
                let error = PipelineError::from(e);
                warn!(key, error = %error, "deferred fetch failed");
                run.advance(
                    LifecycleEvent::DeferredFetchComplete,
                    RecordPatch::new().with_error(error.user_message()),
                )?;
            }
        }
        Ok(run.status)
    }
}

/// Article title when known, else the post text.
fn title_hint(article: Option<&Article>, record: &Record) -> String {
    article
        .map(|a| a.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(&record.primary_text)
        .to_string()
}
