//! Outline prompt construction

use super::SummaryRequest;
use serde::{Deserialize, Serialize};

/// One chat message in the OpenAI wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

fn is_chinese(language: &str) -> bool {
    language.starts_with("zh")
}

fn system_instruction(language: &str) -> &'static str {
    if is_chinese(language) {
        "你是一个擅长将文章和社交媒体内容总结成结构化大纲的助手。输出要精炼、可读、可复用。"
    } else {
        "You summarize articles and social posts into a structured outline. Be concise and reusable."
    }
}

fn output_instruction(language: &str) -> &'static str {
    if is_chinese(language) {
        "请根据以上内容输出：\n1) 标题（可自拟）\n2) 文章/线程大纲（5-8 条要点，每条一行，以\"- \"开头）\n3) 一句话 takeaway（可转发）\n\n要求：\n- 不要胡编；没有信息就写\"未知/未提及\"\n- 如果文章抓不到正文，就以推文/线程为主\n- 输出纯文本"
    } else {
        "Output:\n1) Title\n2) Outline (5-8 bullets, each line starts with \"- \")\n3) One-sentence takeaway\n\nRules:\n- No hallucination; say unknown if missing\n- If article body is unavailable, summarize tweet/thread\n- Plain text only"
    }
}

/// Source material block: article fields first, then the post and thread.
fn user_content(request: &SummaryRequest) -> String {
    let mut parts = Vec::new();
    if let Some(article) = &request.article {
        if !article.resolved_url.is_empty() {
            parts.push(format!("Article URL: {}", article.resolved_url));
        }
        if !article.title.is_empty() {
            parts.push(format!("Article title: {}", article.title));
        }
        if !article.description.is_empty() {
            parts.push(format!("Article description(meta): {}", article.description));
        }
        if !article.excerpt.is_empty() {
            parts.push(format!("Article text(excerpt): {}", article.excerpt));
        }
    }

    parts.push(format!("Tweet text: {}", request.primary_text));
    if !request.thread_texts.is_empty() {
        parts.push(format!(
            "Thread texts:\n- {}",
            request.thread_texts.join("\n- ")
        ));
    }

    format!(
        "{}\n\n{}",
        parts.join("\n\n"),
        output_instruction(&request.language)
    )
}

/// System and user messages for one outline request.
pub fn build_messages(request: &SummaryRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("system", system_instruction(&request.language)),
        ChatMessage::new("user", user_content(request)),
    ]
}
