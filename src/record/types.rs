//! Record: one captured post with its derived artifacts

use super::lifecycle::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one observation of a post
///
/// A new id is minted every time a post is captured, even when the
/// record replaces an earlier one with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user action that produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Liked post: the linked article is fetched and summarized
    Like,
    /// Bookmarked post: the raw text is preserved verbatim
    Bookmark,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Like => "like",
            Kind::Bookmark => "bookmark",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Kind::Like),
            "bookmark" => Ok(Kind::Bookmark),
            other => Err(format!("unknown kind '{}'", other)),
        }
    }
}

/// Metadata and excerpt text fetched from an externally linked page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// URL after following redirects
    pub resolved_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Plain-text excerpt of the page body (capped by the fetcher)
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content_type: String,
}

impl Article {
    /// True when the page yielded no usable text at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.excerpt.is_empty()
    }
}

/// One tracked source item, unique by `key`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Canonical source URL; the de-duplication key
    pub key: String,
    pub kind: Kind,
    pub status: Status,
    #[serde(default)]
    pub primary_text: String,
    /// Long-form body hosted on the social site itself, if any
    #[serde(default)]
    pub long_form_text: String,
    #[serde(default)]
    pub thread_texts: Vec<String>,
    #[serde(default)]
    pub external_links: Vec<String>,
    #[serde(default)]
    pub enrichment: Option<Article>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Assembled flat text, ready for export
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub download_name: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Create a freshly observed record in the `queued` state.
    pub fn new(key: impl Into<String>, kind: Kind) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            key: key.into(),
            kind,
            status: Status::Queued,
            primary_text: String::new(),
            long_form_text: String::new(),
            thread_texts: Vec::new(),
            external_links: Vec::new(),
            enrichment: None,
            summary: None,
            raw_text: None,
            download_name: None,
            error_message: None,
            captured_at: now,
            created_at: now,
        }
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

    pub fn with_captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = at;
        self
    }

    /// Text that best represents the post: the long-form body when present.
    pub fn body_text(&self) -> &str {
        if self.long_form_text.is_empty() {
            &self.primary_text
        } else {
            &self.long_form_text
        }
    }

    /// First external link, the one the pipeline enriches.
    pub fn first_link(&self) -> Option<&str> {
        self.external_links.first().map(String::as_str)
    }

    /// Short human-readable title for listings.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.enrichment.as_ref().map(|a| a.title.as_str()) {
            if !title.is_empty() {
                return title.to_string();
            }
        }
        if !self.primary_text.is_empty() {
            return self.primary_text.chars().take(60).collect();
        }
        self.key.clone()
    }

    /// Apply a patch in place (shallow field overwrite).
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(enrichment) = &patch.enrichment {
            self.enrichment = enrichment.clone();
        }
        if let Some(summary) = &patch.summary {
            self.summary = Some(summary.clone());
        }
        if let Some(raw_text) = &patch.raw_text {
            self.raw_text = Some(raw_text.clone());
        }
        if let Some(name) = &patch.download_name {
            self.download_name = Some(name.clone());
        }
        if let Some(error) = &patch.error_message {
            self.error_message = error.clone();
        }
    }
}

/// A partial update to a record
///
/// Only fields set on the patch are written; everything else keeps its
/// prior value. `enrichment` and `error_message` can also be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub status: Option<Status>,
    pub enrichment: Option<Option<Article>>,
    // Outputs of a finished run. A retry overwrites them but never
    // unsets them, so they are set-only.
    pub summary: Option<String>,
    pub raw_text: Option<String>,
    pub download_name: Option<String>,
    pub error_message: Option<Option<String>>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_enrichment(mut self, article: Option<Article>) -> Self {
        self.enrichment = Some(article);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    pub fn with_download_name(mut self, name: impl Into<String>) -> Self {
        self.download_name = Some(name.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.error_message = Some(None);
        self
    }
}
