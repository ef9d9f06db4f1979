use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use crate::ai::TextSummarizer;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Item, ProcessResult, Selector};
use crate::services::PageFetcher;

/// Upper bounds for the two external calls made per item.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub fetch: Duration,
    pub summarize: Duration,
}

/// Runs items through fetch -> summarize -> persist, one at a time.
#[derive(Clone)]
pub struct Processor {
    repository: Arc<Repository>,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Arc<dyn TextSummarizer>,
    timeouts: Timeouts,
}

impl Processor {
    pub fn new(
        repository: Arc<Repository>,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn TextSummarizer>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            repository,
            fetcher,
            summarizer,
            timeouts,
        }
    }

    pub async fn process(&self, selector: Selector, reprocess: bool) -> Result<ProcessResult> {
        self.process_with(selector, reprocess, None).await
    }

    /// Processes the selected items. A non-blank `instructions` overrides the
    /// stored custom instructions for this batch only.
    ///
    /// Fetch and summarization failures are collected per item. Only a store
    /// failure aborts the batch, as `AppError::Processing`; a single-item
    /// request for an unknown id returns `AppError::NotFound`.
    pub async fn process_with(
        &self,
        selector: Selector,
        reprocess: bool,
        instructions: Option<String>,
    ) -> Result<ProcessResult> {
        let instructions = match instructions.filter(|i| !i.trim().is_empty()) {
            Some(instructions) => instructions,
            None => {
                self.repository
                    .get_settings()
                    .await
                    .map_err(store_failure)?
                    .custom_instructions
            }
        };

        let (items, force) = self.select(selector, reprocess).await?;
        tracing::info!("Processing {} items (force: {})", items.len(), force);

        let mut result = ProcessResult::default();
        for item in items {
            match self.process_item(&item, &instructions, force).await {
                Ok(()) => {
                    tracing::debug!("Processed item {} ({})", item.id, item.url);
                    result.record_success(item.id);
                }
                Err(e) if is_item_failure(&e) => {
                    tracing::warn!("Error processing {}: {}", item.url, e);
                    result.record_failure(item.id, &item.url, e);
                }
                Err(e) => return Err(store_failure(e)),
            }
        }

        let result = result.finish();
        tracing::info!("{}", result.message);
        Ok(result)
    }

    /// Single-item requests always force a refetch regardless of `reprocess`.
    async fn select(&self, selector: Selector, reprocess: bool) -> Result<(Vec<Item>, bool)> {
        match selector {
            Selector::SingleItem(id) => {
                let item = self
                    .repository
                    .get_item(id)
                    .await
                    .map_err(store_failure)?
                    .ok_or(AppError::NotFound(id))?;
                Ok((vec![item], true))
            }
            Selector::AllItems if reprocess => {
                let items = self.repository.list_items().await.map_err(store_failure)?;
                Ok((items, true))
            }
            Selector::AllItems => {
                let items = self
                    .repository
                    .list_unprocessed_items()
                    .await
                    .map_err(store_failure)?;
                Ok((items, false))
            }
        }
    }

    async fn process_item(&self, item: &Item, instructions: &str, force: bool) -> Result<()> {
        let (text, fetched) = match &item.full_text {
            Some(text) if !force => (text.clone(), false),
            _ => (self.fetch(&item.url).await?, true),
        };

        let summary = match self.summarize(&text, instructions).await {
            Ok(summary) => summary,
            Err(e) => {
                // Keep the fetched text so a later pass can skip the fetch.
                if fetched {
                    self.repository.save_full_text(item.id, text).await?;
                }
                return Err(e);
            }
        };

        self.repository
            .mark_processed(item.id, text, summary, Utc::now())
            .await
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        match timeout(self.timeouts.fetch, self.fetcher.fetch_text(url)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(AppError::Fetch(msg))) => Err(AppError::Fetch(msg)),
            Ok(Err(e)) => Err(AppError::Fetch(e.to_string())),
            Err(_) => Err(AppError::Fetch(format!(
                "timed out after {}s",
                self.timeouts.fetch.as_secs_f32()
            ))),
        }
    }

    async fn summarize(&self, text: &str, instructions: &str) -> Result<String> {
        match timeout(self.timeouts.summarize, self.summarizer.summarize(text, instructions)).await {
            Ok(Ok(summary)) if summary.trim().is_empty() => {
                Err(AppError::Summarization("empty summary".to_string()))
            }
            Ok(Ok(summary)) => Ok(summary),
            Ok(Err(AppError::Summarization(msg))) => Err(AppError::Summarization(msg)),
            Ok(Err(e)) => Err(AppError::Summarization(e.to_string())),
            Err(_) => Err(AppError::Summarization(format!(
                "timed out after {}s",
                self.timeouts.summarize.as_secs_f32()
            ))),
        }
    }
}

/// An item deleted mid-batch counts against that item only.
fn is_item_failure(e: &AppError) -> bool {
    matches!(
        e,
        AppError::Fetch(_) | AppError::Summarization(_) | AppError::NotFound(_)
    )
}

fn store_failure(e: AppError) -> AppError {
    match e {
        AppError::Processing(_) => e,
        other => AppError::Processing(other.to_string()),
    }
}
