//! Plain HTTP article fetcher

use super::extract::extract_page;
use super::{ArticleFetcher, FetchError, UrlResolver, HTTP_EXCERPT_CHARS};
use crate::record::Article;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("xliker/", env!("CARGO_PKG_VERSION"));

/// Fetches a page with a single GET, following redirects (t.co and friends).
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    max_chars: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .redirect(Policy::limited(8))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            http,
            max_chars: HTTP_EXCERPT_CHARS,
        })
    }
}

fn network_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Network(format!("request timed out: {}", e))
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Build an article from a fetched body; non-HTML bodies carry no text.
pub(crate) fn article_from_body(
    resolved_url: String,
    content_type: String,
    body: &str,
    max_chars: usize,
) -> Article {
    if !content_type.to_ascii_lowercase().contains("text/html") {
        return Article {
            resolved_url,
            content_type,
            ..Default::default()
        };
    }
    let page = extract_page(body, max_chars);
    Article {
        resolved_url,
        title: page.title,
        description: page.description,
        excerpt: page.text,
        content_type,
    }
}

#[async_trait]
impl ArticleFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<Article, FetchError> {
        let res = self.http.get(url).send().await.map_err(network_error)?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let resolved_url = res.url().to_string();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        debug!(url, %resolved_url, %content_type, "fetched article");

        if !content_type.to_ascii_lowercase().contains("text/html") {
            return Ok(article_from_body(resolved_url, content_type, "", self.max_chars));
        }

        let body = res.text().await.map_err(network_error)?;
        Ok(article_from_body(resolved_url, content_type, &body, self.max_chars))
    }
}

#[async_trait]
impl UrlResolver for HttpFetcher {
    async fn resolve(&self, url: &str) -> String {
        match self.http.get(url).send().await {
            Ok(res) => res.url().to_string(),
            Err(e) => {
                warn!(url, error = %e, "could not resolve link; using it as is");
                url.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_html_body_has_no_text() {
        let article = article_from_body(
            "https://example.com/paper.pdf".into(),
            "application/pdf".into(),
            "%PDF-1.7",
            100,
        );
        assert_eq!(article.resolved_url, "https://example.com/paper.pdf");
        assert_eq!(article.content_type, "application/pdf");
        assert!(article.is_empty());
    }

    #[test]
    fn html_body_is_extracted_and_capped() {
        let html = r#"<html><head><meta property="og:title" content="T"></head>
            <body><p>abcdefghijklmnopqrstuvwxyz</p></body></html>"#;
        let article = article_from_body(
            "https://example.com/post".into(),
            "text/html; charset=utf-8".into(),
            html,
            5,
        );
        assert_eq!(article.title, "T");
        assert_eq!(article.excerpt, "abcde");
    }

    #[tokio::test]
    async fn unresolvable_link_resolves_to_itself() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.resolve("not a url").await, "not a url");
    }

    #[test]
    fn fetcher_builds() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        assert_eq!(fetcher.name(), "http");
        assert_eq!(fetcher.max_chars, HTTP_EXCERPT_CHARS);
    }
}
