//! Summarization client: condenses a post and its article into an outline
//!
//! Defines the client trait and request types. Two implementations:
//! - `ChatSummarizer`: OpenAI-compatible chat completions over HTTP (production)
//! - `MockSummarizer`: returns a preconfigured outline or failure (testing)

mod chat;
mod prompt;

pub use chat::{ChatSummarizer, Provider};
pub use prompt::{build_messages, ChatMessage};

use crate::record::Article;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Maximum characters of a provider error body kept in messages
pub const ERROR_BODY_CHARS: usize = 300;

/// Everything the summarizer sees about one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Output language tag, e.g. `zh-CN` or `en`
    pub language: String,
    pub primary_text: String,
    pub thread_texts: Vec<String>,
    /// Linked article, when one was fetched
    pub article: Option<Article>,
}

/// Errors from summarization.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
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
    #[error("response parse error: {0}")]
    Parse(String),
}

/// Client trait for summarization.
///
/// Abstracts over transport so the pipeline does not depend on which
/// provider is reached or how.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a plain-text structured outline.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError>;
}

/// Mock summarizer for testing; returns a preconfigured response.
pub struct MockSummarizer {
    response: Result<String, MockFailure>,
    calls: AtomicUsize,
    last_request: Mutex<Option<SummaryRequest>>,
}

#[derive(Debug, Clone)]
enum MockFailure {
    MissingCredential,
    Provider(u16, String),
}

impl MockSummarizer {
    /// A summarizer that always answers with `outline`.
    pub fn answering(outline: impl Into<String>) -> Self {
        Self::with_result(Ok(outline.into()))
    }

    /// A summarizer with no API key configured.
    pub fn missing_credential() -> Self {
        Self::with_result(Err(MockFailure::MissingCredential))
    }

    /// A summarizer whose provider answers with an HTTP error.
    pub fn provider_error(status: u16, body: impl Into<String>) -> Self {
        Self::with_result(Err(MockFailure::Provider(status, body.into())))
    }

    fn with_result(response: Result<String, MockFailure>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `summarize` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<SummaryRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.response {
            Ok(outline) => Ok(outline.clone()),
            Err(MockFailure::MissingCredential) => {
                Err(SummarizeError::MissingCredential("mock".to_string()))
            }
            Err(MockFailure::Provider(status, body)) => Err(SummarizeError::Provider {
                label: "Mock".to_string(),
                status: *status,
                body: body.clone(),
            }),
        }
    }
}
