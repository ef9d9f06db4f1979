use std::sync::Arc;

use crate::bookmarks::BookmarkSource;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{NewItem, SyncResult};

/// One-way, additive reconciliation of a bookmark source into the item store.
#[derive(Clone)]
pub struct SyncEngine {
    repository: Arc<Repository>,
    source: Arc<dyn BookmarkSource>,
}

impl SyncEngine {
    pub fn new(repository: Arc<Repository>, source: Arc<dyn BookmarkSource>) -> Self {
        Self { repository, source }
    }

    /// Inserts every entry whose url is not stored yet. Existing items are
    /// never modified. The source is read in full before the first write, so
    /// an unreadable source leaves the store untouched.
    pub async fn sync(&self) -> Result<SyncResult> {
        let entries = self.source.entries()?;
        let mut result = SyncResult::default();

        for entry in entries {
            if entry.url.trim().is_empty() {
                tracing::warn!("Skipping reading list entry without a url");
                result.skipped += 1;
                continue;
            }

            let url = entry.url.clone();
            let inserted = self
                .repository
                .insert_item(NewItem {
                    url: entry.url,
                    title: entry.title,
                    preview_text: entry.preview_text,
                    added_at: entry.added_at,
                })
                .await?;

            match inserted {
                Some(id) => {
                    tracing::debug!("Added item {} for {}", id, url);
                    result.added += 1;
                }
                None => result.skipped += 1,
            }
        }

        tracing::info!("Sync finished: {} added, {} skipped", result.added, result.skipped);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::stubs::{entry, memory_repo, StaticSource};
    use chrono::Utc;

    #[tokio::test]
    async fn sync_is_idempotent() {
        let repo = memory_repo().await;
        let source = StaticSource::new(vec![entry("http://a.test", "A"), entry("http://b.test", "B")]);
        let engine = SyncEngine::new(repo.clone(), Arc::new(source));

        let first = engine.sync().await.unwrap();
        assert_eq!(first, SyncResult { added: 2, skipped: 0 });

        let second = engine.sync().await.unwrap();
        assert_eq!(second, SyncResult { added: 0, skipped: 2 });
        assert_eq!(repo.list_items().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_urls_in_one_pass_are_stored_once() {
        let repo = memory_repo().await;
        let source = StaticSource::new(vec![entry("http://a.test", "A"), entry("http://a.test", "A again")]);
        let result = SyncEngine::new(repo.clone(), Arc::new(source)).sync().await.unwrap();

        assert_eq!(result, SyncResult { added: 1, skipped: 1 });
        let items = repo.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn new_items_are_unprocessed() {
        let repo = memory_repo().await;
        let source = StaticSource::new(vec![entry("http://a.test", "A")]);
        SyncEngine::new(repo.clone(), Arc::new(source)).sync().await.unwrap();

        let items = repo.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].processed);
        assert_eq!(items[0].summary, None);
        assert_eq!(items[0].full_text, None);
        assert_eq!(items[0].preview_text.as_deref(), Some("Preview of A"));
    }

    #[tokio::test]
    async fn existing_items_are_left_alone() {
        let repo = memory_repo().await;
        let id = repo
            .insert_item(NewItem {
                url: "http://a.test".to_string(),
                title: Some("Original".to_string()),
                preview_text: None,
                added_at: None,
            })
            .await
            .unwrap()
            .unwrap();
        repo.mark_processed(id, "body".to_string(), "kept".to_string(), Utc::now())
            .await
            .unwrap();
        let before = repo.get_item(id).await.unwrap().unwrap();

        let source = StaticSource::new(vec![entry("http://a.test", "Renamed")]);
        let result = SyncEngine::new(repo.clone(), Arc::new(source)).sync().await.unwrap();

        assert_eq!(result.added, 0);
        assert_eq!(repo.get_item(id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn entries_without_url_are_skipped() {
        let repo = memory_repo().await;
        let source = StaticSource::new(vec![entry("", "Nothing"), entry("http://a.test", "A")]);
        let result = SyncEngine::new(repo.clone(), Arc::new(source)).sync().await.unwrap();

        assert_eq!(result, SyncResult { added: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn whitespace_only_urls_are_skipped() {
        let repo = memory_repo().await;
        let source = StaticSource::new(vec![entry("   ", "Blank"), entry("\t\n", "Tabs")]);
        let result = SyncEngine::new(repo.clone(), Arc::new(source)).sync().await.unwrap();

        assert_eq!(result, SyncResult { added: 0, skipped: 2 });
        assert!(repo.list_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_source_fails_without_writes() {
        let repo = memory_repo().await;
        let engine = SyncEngine::new(repo.clone(), Arc::new(StaticSource::failing("corrupt plist")));

        let result = engine.sync().await;
        assert!(matches!(result, Err(AppError::Sync(_))));
        assert!(repo.list_items().await.unwrap().is_empty());
    }
}
