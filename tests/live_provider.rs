//! Live summarization against a hosted provider
//!
//! Run with `cargo test --features real_llm` and an API key in the
//! environment (`DEEPSEEK_API_KEY` or `OPENAI_API_KEY`).

#![cfg(feature = "real_llm")]

use xliker::{Article, ChatSummarizer, Settings, Summarizer, SummaryRequest};

#[tokio::test]
async fn provider_returns_outline() {
    let settings = Settings::default();
    let summarizer = ChatSummarizer::new(settings.provider, settings.http_timeout())
        .expect("client")
        .with_model(settings.model())
        .with_base_url(settings.base_url())
        .with_api_key(settings.api_key());

    let request = SummaryRequest {
        language: "en".to_string(),
        primary_text: "Rust 1.80 stabilizes LazyCell and LazyLock.".to_string(),
        thread_texts: vec!["Exclusive ranges in patterns land too.".to_string()],
        article: Some(Article {
            resolved_url: "https://blog.rust-lang.org/".to_string(),
            title: "Announcing Rust 1.80.0".to_string(),
            ..Default::default()
        }),
    };

    let outline = summarizer.summarize(&request).await.expect("summary");
    println!("{}", outline);
    assert!(!outline.is_empty());
}
