//! Article fetching: enriches a captured post with its linked page
//!
//! Three implementations of `ArticleFetcher`:
//! - `HttpFetcher`: plain GET with redirects (primary)
//! - `RenderFetcher`: headless browser DOM dump with a wall-clock timeout (fallback)
//! - `FallbackFetcher`: tries one fetcher, then another

mod extract;
mod http;
mod render;

pub use extract::{extract_page, normalize_whitespace, truncate_chars, PageText};
pub(crate) use extract::{selector, visible_text};
pub use http::HttpFetcher;
pub use render::RenderFetcher;

use crate::record::Article;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Excerpt cap for plain HTTP fetches
pub const HTTP_EXCERPT_CHARS: usize = 12_000;

/// Excerpt cap for rendered pages
pub const RENDER_EXCERPT_CHARS: usize = 40_000;

/// Errors from article fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("render failed: {0}")]
    Render(String),
}

/// Fetches the page behind an external link.
///
/// Abstracts over retrieval strategy so the pipeline does not depend on
/// how a page is reached.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn fetch(&self, url: &str) -> Result<Article, FetchError>;
}

/// Follows redirects to find where a link really points.
///
/// Resolution never fails: an unreachable link resolves to itself.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> String;
}

/// Tries `primary`; on failure, tries `fallback`.
pub struct FallbackFetcher {
    primary: Arc<dyn ArticleFetcher>,
    fallback: Arc<dyn ArticleFetcher>,
}

impl FallbackFetcher {
    pub fn new(primary: Arc<dyn ArticleFetcher>, fallback: Arc<dyn ArticleFetcher>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl ArticleFetcher for FallbackFetcher {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        match self.primary.fetch(url).await {
            Ok(article) => Ok(article),
            Err(e) => {
                warn!(
                    url,
                    error = %e,
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "primary fetch failed; trying fallback"
                );
                self.fallback.fetch(url).await
            }
        }
    }
}
