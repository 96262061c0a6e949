//! Render-based article fetcher
//!
//! Some sites refuse plain fetches or build their content with script.
//! This fetcher asks a headless browser to load the page and dump the
//! rendered DOM, then extracts text from that. Short links are resolved
//! first so the browser loads, and the article records, the final URL.
//! The browser process is killed on every exit path, including timeout.

use super::http::article_from_body;
use super::{ArticleFetcher, FetchError, UrlResolver, RENDER_EXCERPT_CHARS};
use crate::record::Article;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Configuration for the headless renderer
#[derive(Clone)]
pub struct RenderFetcher {
    /// Browser executable
    program: String,
    /// Arguments placed before the URL
    args: Vec<String>,
    /// Wall-clock limit for one render
    timeout: Duration,
    max_chars: usize,
    /// Redirect resolution applied before rendering
    resolver: Option<Arc<dyn UrlResolver>>,
}

impl RenderFetcher {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            max_chars: RENDER_EXCERPT_CHARS,
            resolver: None,
        }
    }

    /// Resolve links with `resolver` before handing them to the browser.
    pub fn with_resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn render(&self, url: &str) -> Result<String, FetchError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FetchError::Render(format!("failed to start {}: {}", self.program, e)))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(FetchError::Render(format!("renderer I/O: {}", e))),
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(FetchError::Render(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ArticleFetcher for RenderFetcher {
    fn name(&self) -> &str {
        "render"
    }

    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        let resolved_url = match &self.resolver {
            Some(resolver) => resolver.resolve(url).await,
            None => url.to_string(),
        };
        let dom = self.render(&resolved_url).await?;
        debug!(url, %resolved_url, bytes = dom.len(), "rendered article");
        Ok(article_from_body(
            resolved_url,
            "text/html".to_string(),
            &dom,
            self.max_chars,
        ))
    }
}
