use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const MAX_CONTENT_CHARS: usize = 400_000;
const TRUNCATION_NOTICE: &str = "\n\n[Content truncated due to length...]";

pub const DEFAULT_INSTRUCTIONS: &str = "Please provide a concise summary of the following content. \
Focus on the main points, key takeaways, and any important insights.";

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

/// Turns extracted page text into a summary following the given instructions.
/// Blank instructions mean [`DEFAULT_INSTRUCTIONS`].
#[async_trait]
pub trait TextSummarizer: Send + Sync {
    async fn summarize(&self, text: &str, instructions: &str) -> Result<String>;
}

pub struct Summarizer {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl Summarizer {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl TextSummarizer for Summarizer {
    async fn summarize(&self, text: &str, instructions: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AppError::Summarization(
                "Anthropic API key not provided".to_string(),
            ));
        };

        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            messages: vec![Message {
                role: "user".to_string(),
                content: build_prompt(text, instructions),
            }],
        };

        let response = self
            .client
            .post(CLAUDE_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Summarization(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Summarization(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::Summarization(e.to_string()))?;

        let summary = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if summary.trim().is_empty() {
            return Err(AppError::Summarization("empty response from model".to_string()));
        }

        Ok(summary)
    }
}

fn build_prompt(text: &str, instructions: &str) -> String {
    let instructions = if instructions.trim().is_empty() {
        DEFAULT_INSTRUCTIONS
    } else {
        instructions
    };
    format!("{instructions}\n\nContent:\n\n{}", truncate_content(text))
}

fn truncate_content(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_NOTICE}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_instructions_use_default() {
        let prompt = build_prompt("Body", "   ");
        assert!(prompt.starts_with(DEFAULT_INSTRUCTIONS));
        assert!(prompt.ends_with("Content:\n\nBody"));
    }

    #[test]
    fn custom_instructions_replace_default() {
        let prompt = build_prompt("Body", "Three bullet points.");
        assert!(prompt.starts_with("Three bullet points.\n\nContent:"));
        assert!(!prompt.contains(DEFAULT_INSTRUCTIONS));
    }

    #[test]
    fn long_content_is_truncated_on_char_boundary() {
        let text = "é".repeat(MAX_CONTENT_CHARS + 10);
        let truncated = truncate_content(&text);
        assert!(truncated.ends_with(TRUNCATION_NOTICE));
        let kept = truncated.trim_end_matches(TRUNCATION_NOTICE);
        assert_eq!(kept.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("short"), "short");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_request() {
        let summarizer =
            Summarizer::new(None, "model".to_string(), Duration::from_secs(1)).unwrap();
        let result = summarizer.summarize("text", "").await;
        match result {
            Err(AppError::Summarization(msg)) => assert_eq!(msg, "Anthropic API key not provided"),
            other => panic!("expected summarization error, got {other:?}"),
        }
    }
}
