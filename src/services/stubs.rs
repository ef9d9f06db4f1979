//! In-memory stand-ins for the external collaborators, shared by tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::TextSummarizer;
use crate::bookmarks::{BookmarkEntry, BookmarkSource};
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::services::PageFetcher;

pub async fn memory_repo() -> Arc<Repository> {
    Arc::new(Repository::new(":memory:").await.unwrap())
}

pub fn entry(url: &str, title: &str) -> BookmarkEntry {
    BookmarkEntry {
        url: url.to_string(),
        title: Some(title.to_string()),
        preview_text: Some(format!("Preview of {title}")),
        added_at: None,
    }
}

pub struct StaticSource {
    entries: std::result::Result<Vec<BookmarkEntry>, String>,
}

impl StaticSource {
    pub fn new(entries: Vec<BookmarkEntry>) -> Self {
        Self { entries: Ok(entries) }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            entries: Err(message.to_string()),
        }
    }
}

impl BookmarkSource for StaticSource {
    fn entries(&self) -> Result<Vec<BookmarkEntry>> {
        self.entries.clone().map_err(AppError::Sync)
    }
}

/// Serves canned page text per url. Unknown urls fail like a 404.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("HTTP 404 Not Found for {url}")))
    }
}

/// Returns a fixed summary, failing for any text containing `fail_on`.
pub struct StubSummarizer {
    summary: String,
    fail_on: Option<String>,
    delay: Option<Duration>,
    instructions_seen: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub fn returning(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            fail_on: None,
            delay: None,
            instructions_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn instructions_seen(&self) -> Vec<String> {
        self.instructions_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextSummarizer for StubSummarizer {
    async fn summarize(&self, text: &str, instructions: &str) -> Result<String> {
        self.instructions_seen
            .lock()
            .unwrap()
            .push(instructions.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_on {
            Some(marker) if text.contains(marker.as_str()) => {
                Err(AppError::Summarization("rate limited".to_string()))
            }
            _ => Ok(self.summary.clone()),
        }
    }
}
