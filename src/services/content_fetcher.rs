use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};

const USER_AGENT_STRING: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

// Elements that never carry article text.
const STRIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

static STRIP_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Retrieves a page and extracts its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for ContentFetcher {
    async fn fetch_text(&self, page_url: &str) -> Result<String> {
        let url = Url::parse(page_url)
            .map_err(|e| AppError::Fetch(format!("invalid url {page_url}: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("Failed to fetch {}: {}", page_url, response.status());
            return Err(AppError::Fetch(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        extract_text(&html)
            .ok_or_else(|| AppError::Fetch(format!("no readable content at {page_url}")))
    }
}

fn strip_patterns() -> &'static [Regex] {
    STRIP_PATTERNS.get_or_init(|| {
        STRIPPED_TAGS
            .iter()
            .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
            .collect()
    })
}

/// Converts HTML to plain text, dropping page chrome and blank runs.
pub fn extract_text(html: &str) -> Option<String> {
    let mut body = html.to_string();
    for pattern in strip_patterns() {
        body = pattern.replace_all(&body, "").into_owned();
    }

    let text = match html2text::from_read(body.as_bytes(), 100) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("Failed to convert HTML to text: {}", e);
            return None;
        }
    };

    let cleaned = text
        .lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
