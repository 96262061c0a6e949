//! HTML metadata and plain-text extraction

use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "svg", "template"];

/// Title, description and body text pulled from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub title: String,
    pub description: String,
    pub text: String,
}

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn meta_content(doc: &Html, css: &'static str) -> String {
    doc.select(&selector(css))
        .find_map(|m| m.value().attr("content"))
        .map(normalize_whitespace)
        .unwrap_or_default()
}

fn first_text(doc: &Html, css: &'static str) -> String {
    doc.select(&selector(css))
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Visible text under `root`, skipping script-like elements.
pub(crate) fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(text);
        }
    }
    normalize_whitespace(&parts.join(" "))
}

/// Extract title, description and body text, capping text at `max_chars`.
///
/// Title prefers `og:title` over `<title>`; description prefers
/// `og:description` over `meta[name=description]`.
pub fn extract_page(html: &str, max_chars: usize) -> PageText {
    let doc = Html::parse_document(html);

    let mut title = meta_content(&doc, r#"meta[property="og:title"]"#);
    if title.is_empty() {
        title = first_text(&doc, "title");
    }

    let mut description = meta_content(&doc, r#"meta[property="og:description"]"#);
    if description.is_empty() {
        description = meta_content(&doc, r#"meta[name="description"]"#);
    }

    let text = doc
        .select(&selector("body"))
        .next()
        .map(visible_text)
        .unwrap_or_else(|| visible_text(doc.root_element()));

    PageText {
        title,
        description,
        text: truncate_chars(&text, max_chars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>  Fallback   Title </title>
            <meta property="og:title" content="OG Title">
            <meta name="description" content="Plain description">
            <style>body { color: red; }</style>
          </head>
          <body>
            <h1>Heading</h1>
            <script>var x = "hidden";</script>
            <p>First   paragraph.</p>
            <noscript>enable js</noscript>
            <svg><text>icon</text></svg>
            <p>Second &amp; last.</p>
          </body>
        </html>
    "#;

    #[test]
    fn prefers_og_title_and_falls_back_for_description() {
        let page = extract_page(PAGE, 1000);
        assert_eq!(page.title, "OG Title");
        assert_eq!(page.description, "Plain description");
    }

    #[test]
    fn strips_script_like_elements() {
        let page = extract_page(PAGE, 1000);
        assert_eq!(page.text, "Heading First paragraph. Second & last.");
    }

    #[test]
    fn uses_title_tag_without_og() {
        let page = extract_page("<html><head><title>Only  Title</title></head><body>x</body></html>", 10);
        assert_eq!(page.title, "Only Title");
        assert_eq!(page.description, "");
    }

    #[test]
    fn caps_text_length() {
        let body = "word ".repeat(100);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let page = extract_page(&html, 12);
        assert_eq!(page.text.chars().count(), 12);
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
