//! OpenAI-compatible chat completions summarizer (DeepSeek, OpenAI)

use super::prompt::{build_messages, ChatMessage};
use super::{SummarizeError, Summarizer, SummaryRequest, ERROR_BODY_CHARS};
use crate::article::truncate_chars;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const TEMPERATURE: f64 = 0.2;

/// Which hosted provider answers summary requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    DeepSeek,
    OpenAi,
}

impl Provider {
    /// Human-readable name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DeepSeek",
            Provider::OpenAi => "OpenAI",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek-chat",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// The other provider, whose key is accepted as a fallback
    pub fn other(&self) -> Provider {
        match self {
            Provider::DeepSeek => Provider::OpenAi,
            Provider::OpenAi => Provider::DeepSeek,
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deepseek" => Ok(Provider::DeepSeek),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

/// Summarizer backed by a `/chat/completions` endpoint.
pub struct ChatSummarizer {
    http: Client,
    provider: Provider,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl ChatSummarizer {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, SummarizeError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::Network(e.to_string()))?;
        Ok(Self {
            http,
            provider,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            api_key: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API key; blank keys count as missing.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Extract `choices[0].message.content` from a response body.
///
/// A response without content, or with only whitespace, is a parse error.
pub(crate) fn parse_content(body: &str) -> Result<String, SummarizeError> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| SummarizeError::Parse(format!("invalid response JSON: {}", e)))?;
    let content = v["choices"][0]["message"]["content"]
        .as_str()
        .map(str::trim)
        .unwrap_or_default();
    if content.is_empty() {
        return Err(SummarizeError::Parse(
            "response has no message content".to_string(),
        ));
    }
    Ok(content.to_string())
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizeError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SummarizeError::MissingCredential(self.provider.label().to_string()))?;

        let payload = ChatRequest {
            model: &self.model,
            messages: build_messages(request),
            temperature: TEMPERATURE,
        };

        info!(provider = self.provider.label(), model = %self.model, "requesting outline");
        let res = self
            .http
            .post(self.url())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SummarizeError::Network(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(SummarizeError::Provider {
                label: self.provider.label().to_string(),
                status: status.as_u16(),
                body: truncate_chars(&body, ERROR_BODY_CHARS),
            });
        }

        debug!(bytes = body.len(), "outline response received");
        parse_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults() {
        assert_eq!(Provider::default(), Provider::DeepSeek);
        assert_eq!(Provider::OpenAi.default_model(), "gpt-4o-mini");
        assert_eq!(Provider::DeepSeek.other(), Provider::OpenAi);
        assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAi);
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&Provider::DeepSeek).unwrap(), "\"deepseek\"");
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Title\n- a\n- b \n"}}]}"#;
        assert_eq!(parse_content(body).unwrap(), "Title\n- a\n- b");
    }

    #[test]
    fn missing_or_blank_content_is_parse_error() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"  \n "}}]}"#,
        ] {
            assert!(
                matches!(parse_content(body), Err(SummarizeError::Parse(_))),
                "{}",
                body
            );
        }
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            parse_content("<html>"),
            Err(SummarizeError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn blank_key_is_missing_credential() {
        let summarizer = ChatSummarizer::new(Provider::OpenAi, Duration::from_secs(1))
            .unwrap()
            .with_api_key(Some("   ".into()));
        let err = summarizer
            .summarize(&SummaryRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MissingCredential(ref p) if p == "OpenAI"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let summarizer = ChatSummarizer::new(Provider::DeepSeek, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(summarizer.url(), "http://localhost:8080/v1/chat/completions");
    }
}
