//! Flat-text export of captured records
//!
//! The export is meant for people, not for machines: a record becomes a
//! plain text block with labelled sections, and several records are
//! joined under `===== i/N =====` headers.

use crate::record::{Article, Kind, Record, Status};
use thiserror::Error;

const SEPARATOR: &str = "\n---\n";
const FILENAME_MAX_CHARS: usize = 120;
const FALLBACK_NAME: &str = "x-bookmark";
const EXPORT_DIR: &str = "x-liker";

/// Requested keys that cannot be exported
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("record not found: {}", .0.join(", "))]
    Unknown(Vec<String>),

    #[error("record not ready for export (needs status done with assembled text): {}", .0.join(", "))]
    NotExportable(Vec<String>),
}

/// Inputs of the assembled text, borrowed from a record or a pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ExportParts<'a> {
    pub kind: Kind,
    pub key: &'a str,
    /// Post text, long-form body preferred
    pub body_text: &'a str,
    pub thread_texts: &'a [String],
    pub article: Option<&'a Article>,
    pub summary: Option<&'a str>,
}

impl<'a> ExportParts<'a> {
    pub fn from_record(record: &'a Record) -> Self {
        Self {
            kind: record.kind,
            key: &record.key,
            body_text: record.body_text(),
            thread_texts: &record.thread_texts,
            article: record.enrichment.as_ref(),
            summary: record.summary.as_deref(),
        }
    }

    /// Same parts with a different article.
    pub fn with_article(mut self, article: Option<&'a Article>) -> Self {
        self.article = article;
        self
    }
}

/// Assemble the flat text for one record.
pub fn build_export_text(parts: &ExportParts<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# kind: {}", parts.kind));
    if !parts.key.is_empty() {
        lines.push(format!("Tweet: {}", parts.key));
    }
    lines.push(SEPARATOR.to_string());

    if !parts.body_text.is_empty() {
        lines.push(format!("Tweet text:\n{}", parts.body_text));
        lines.push(SEPARATOR.to_string());
    }

    if !parts.thread_texts.is_empty() {
        lines.push(format!("Thread texts:\n- {}", parts.thread_texts.join("\n- ")));
        lines.push(SEPARATOR.to_string());
    }

    if let Some(article) = parts.article {
        if !article.resolved_url.is_empty() {
            lines.push(format!("Article: {}", article.resolved_url));
            if !article.title.is_empty() {
                lines.push(format!("Title: {}", article.title));
            }
            if !article.description.is_empty() {
                lines.push(format!("Description: {}", article.description));
            }
            lines.push(SEPARATOR.to_string());
        }
        if !article.excerpt.is_empty() {
            lines.push(format!("Article text (excerpt):\n{}", article.excerpt));
        }
    }

    if let Some(summary) = parts.summary.filter(|s| !s.is_empty()) {
        lines.push(format!("Summary:\n{}", summary));
    }

    lines.join("\n").trim().to_string()
}

/// Make a string safe to use as a file name.
pub fn safe_filename(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(FILENAME_MAX_CHARS).collect()
}

/// Suggested export path for a record, derived from a title hint.
pub fn download_name(hint: &str) -> String {
    let base = safe_filename(hint);
    let base = if base.is_empty() { FALLBACK_NAME } else { base.as_str() };
    format!("{}/{}.txt", EXPORT_DIR, base)
}

/// Whether a record can be exported: finished with assembled text.
pub fn is_exportable(record: &Record) -> bool {
    record.status == Status::Done && record.raw_text.as_deref().is_some_and(|t| !t.is_empty())
}

/// Concatenate every exportable record under `===== i/N =====` headers.
pub fn export_all(records: &[Record]) -> String {
    let exportable: Vec<&str> = records
        .iter()
        .filter(|r| is_exportable(r))
        .filter_map(|r| r.raw_text.as_deref())
        .collect();
    let total = exportable.len();
    exportable
        .iter()
        .enumerate()
        .map(|(i, text)| format!("===== {}/{} =====\n{}", i + 1, total, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Export text for the requested keys.
///
/// No keys exports every exportable record, like `export_all`. One key
/// yields that record's assembled text without a header. Several keys
/// are exported in history order under `===== i/N =====` headers. Every
/// requested key must name an exportable record.
pub fn export_keys(records: &[Record], keys: &[String]) -> Result<String, ExportError> {
    if keys.is_empty() {
        return Ok(export_all(records));
    }

    let unknown: Vec<String> = keys
        .iter()
        .filter(|k| !records.iter().any(|r| &r.key == *k))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ExportError::Unknown(unknown));
    }

    let selected: Vec<Record> = records
        .iter()
        .filter(|r| keys.contains(&r.key))
        .cloned()
        .collect();
    let blocked: Vec<String> = selected
        .iter()
        .filter(|r| !is_exportable(r))
        .map(|r| r.key.clone())
        .collect();
    if !blocked.is_empty() {
        return Err(ExportError::NotExportable(blocked));
    }

    match selected.as_slice() {
        [single] => Ok(single.raw_text.clone().unwrap_or_default()),
        many => Ok(export_all(many)),
    }
}
