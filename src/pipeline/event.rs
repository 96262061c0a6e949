//! Capture events, the typed input of a pipeline

use super::PipelineError;
use crate::record::{Kind, Record};
use crate::scrape::{ScrapedPost, Scraper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed like or bookmark action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub kind: Kind,
    /// Canonical permalink of the post
    pub key: String,
    #[serde(default)]
    pub primary_text: String,
    #[serde(default)]
    pub long_form_text: String,
    #[serde(default)]
    pub thread_texts: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

impl CaptureEvent {
    pub fn new(kind: Kind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
            primary_text: String::new(),
            long_form_text: String::new(),
            thread_texts: Vec::new(),
            external_links: Vec::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn like(key: impl Into<String>) -> Self {
        Self::new(Kind::Like, key)
    }

    pub fn bookmark(key: impl Into<String>) -> Self {
        Self::new(Kind::Bookmark, key)
    }

    pub fn from_scraped(kind: Kind, post: ScrapedPost) -> Self {
        Self {
            kind,
            key: post.permalink_key,
            primary_text: post.primary_text,
            long_form_text: post.long_form_text,
            thread_texts: post.thread_texts,
            external_links: post.external_links,
            captured_at: Utc::now(),
        }
    }

    /// Scrape a page into an event; no usable post is `ScrapeUnavailable`.
    pub fn from_page(
        kind: Kind,
        scraper: &dyn Scraper,
        html: &str,
        page_url: &str,
    ) -> Result<Self, PipelineError> {
        scraper
            .scrape(html, page_url)
            .map(|post| Self::from_scraped(kind, post))
            .ok_or(PipelineError::ScrapeUnavailable)
    }

    pub fn with_primary_text(mut self, text: impl Into<String>) -> Self {
        self.primary_text = text.into();
        self
    }

    pub fn with_long_form_text(mut self, text: impl Into<String>) -> Self {
        self.long_form_text = text.into();
        self
    }

    pub fn with_thread_texts(mut self, texts: Vec<String>) -> Self {
        self.thread_texts = texts;
        self
    }

    pub fn with_external_links(mut self, links: Vec<String>) -> Self {
        self.external_links = links;
        self
    }

    /// The freshly observed record for this event.
    pub fn to_record(&self) -> Record {
        Record::new(self.key.clone(), self.kind)
            .with_primary_text(self.primary_text.clone())
            .with_long_form_text(self.long_form_text.clone())
            .with_thread_texts(self.thread_texts.clone())
            .with_external_links(self.external_links.clone())
            .with_captured_at(self.captured_at)
    }
}
