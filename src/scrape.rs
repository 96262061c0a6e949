//! Post scraping from a saved timeline or conversation page
//!
//! The heuristics follow the host site's current markup and are
//! best-effort: missing elements produce empty fields, never errors. A
//! page with no post permalink yields `None` (nothing to capture).

use crate::article::{normalize_whitespace, selector, truncate_chars, visible_text};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Minimum length for page text to count as a long-form article
const LONG_FORM_MIN_CHARS: usize = 200;
const LONG_FORM_MAX_CHARS: usize = 40_000;
/// Conversation text blocks considered for the thread
const THREAD_SCAN_LIMIT: usize = 12;

/// What a scraper extracts about one post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPost {
    /// Canonical permalink, used as the record key
    pub permalink_key: String,
    pub primary_text: String,
    pub long_form_text: String,
    pub thread_texts: Vec<String>,
    pub external_links: Vec<String>,
}

/// Produces post data from a rendered page.
///
/// Returns `None` when the page has no usable post structure.
pub trait Scraper: Send + Sync {
    fn scrape(&self, html: &str, page_url: &str) -> Option<ScrapedPost>;
}

/// Scraper for the social site's timeline markup
#[derive(Debug, Clone)]
pub struct TimelineScraper {
    /// Hosts treated as internal (links to them are not external)
    internal_hosts: Vec<String>,
}

impl Default for TimelineScraper {
    fn default() -> Self {
        Self {
            internal_hosts: vec!["x.com".to_string(), "twitter.com".to_string()],
        }
    }
}

impl TimelineScraper {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_external(&self, href: &str) -> bool {
        let Ok(url) = Url::parse(href) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let host = url.host_str().unwrap_or_default();
        !self
            .internal_hosts
            .iter()
            .any(|h| host == h || host.ends_with(&format!(".{}", h)))
    }

    fn permalink(post: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
        let href = post
            .select(&selector(r#"a[href*="/status/"]"#))
            .find_map(|a| a.value().attr("href"))?;
        match base {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Url::parse(href).ok().map(|u| u.to_string()),
        }
    }

    fn post_text(post: ElementRef<'_>) -> String {
        post.select(&selector(r#"div[data-testid="tweetText"]"#))
            .next()
            .map(visible_text)
            .unwrap_or_default()
    }

    fn external_links(&self, post: ElementRef<'_>) -> Vec<String> {
        let mut seen = HashSet::new();
        post.select(&selector(r#"a[href^="http"]"#))
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| self.is_external(href))
            .filter(|href| seen.insert(href.to_string()))
            .map(str::to_string)
            .collect()
    }

    fn long_form_text(doc: &Html) -> String {
        let root = doc
            .select(&selector(r#"[data-testid="article"]"#))
            .next()
            .or_else(|| doc.select(&selector(r#"article[role="article"]"#)).next())
            .or_else(|| doc.select(&selector("main")).next());
        let Some(root) = root else {
            return String::new();
        };
        let text = visible_text(root);
        if text.chars().count() < LONG_FORM_MIN_CHARS {
            return String::new();
        }
        truncate_chars(&text, LONG_FORM_MAX_CHARS)
    }

    fn thread_texts(doc: &Html, on_status_page: bool) -> Vec<String> {
        if !on_status_page {
            return Vec::new();
        }
        let container = doc
            .select(&selector(r#"div[aria-label^="Timeline: Conversation"]"#))
            .next()
            .or_else(|| doc.select(&selector(r#"div[aria-label*="Conversation"]"#)).next())
            .or_else(|| doc.select(&selector("main")).next())
            .unwrap_or_else(|| doc.root_element());

        let mut seen = HashSet::new();
        container
            .select(&selector(r#"article div[data-testid="tweetText"]"#))
            .take(THREAD_SCAN_LIMIT)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}

impl Scraper for TimelineScraper {
    fn scrape(&self, html: &str, page_url: &str) -> Option<ScrapedPost> {
        let doc = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let (post, permalink_key) = doc
            .select(&selector("article"))
            .find_map(|a| Self::permalink(a, base.as_ref()).map(|key| (a, key)))?;

        let long_form_text = Self::long_form_text(&doc);
        let mut primary_text = Self::post_text(post);
        if primary_text.is_empty() && !long_form_text.is_empty() {
            primary_text = long_form_text.clone();
        }

        let on_status_page = base
            .as_ref()
            .map(|u| u.path().contains("/status/"))
            .unwrap_or(false);
        let mut thread_texts = Self::thread_texts(&doc, on_status_page);
        if !primary_text.is_empty() && thread_texts.first() == Some(&primary_text) {
            thread_texts.remove(0);
        }

        Some(ScrapedPost {
            permalink_key,
            primary_text,
            long_form_text,
            thread_texts,
            external_links: self.external_links(post),
        })
    }
}
