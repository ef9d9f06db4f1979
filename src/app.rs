use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ai::{Summarizer, TextSummarizer};
use crate::bookmarks::{BookmarkSource, SafariReadingList};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Item, ItemFilter, ProcessResult, Selector, Settings, SyncResult};
use crate::services::{ContentFetcher, PageFetcher, Processor, SyncEngine, Timeouts};
use crate::tui::AppAction;

// Message for a finished background job
pub enum TaskResult {
    Sync(std::result::Result<SyncResult, String>),
    Process(std::result::Result<ProcessResult, String>),
}

pub struct App {
    // Data
    pub items: Vec<Item>,

    // UI State
    pub selected_index: usize,
    pub filter: ItemFilter,
    pub show_help: bool,
    pub instructions_input_active: bool,
    pub instructions_input: String,
    pub status_message: Option<String>,
    pub last_failures: Vec<String>,

    // Async state
    pub busy: Option<&'static str>,
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    // Services
    repository: Arc<Repository>,
    sync_engine: SyncEngine,
    processor: Processor,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);
        let source = Arc::new(SafariReadingList::new(&config.bookmarks_path));
        let fetcher = Arc::new(ContentFetcher::new(config.fetch_timeout())?);
        let summarizer = Arc::new(Summarizer::new(
            config.claude_api_key.clone(),
            config.claude_model.clone(),
            config.summarize_timeout(),
        )?);

        if config.claude_api_key.is_none() {
            tracing::warn!("No Claude API key configured; summaries will fail");
        }

        let timeouts = Timeouts {
            fetch: config.fetch_timeout(),
            summarize: config.summarize_timeout(),
        };

        Self::with_services(repository, source, fetcher, summarizer, timeouts).await
    }

    pub async fn with_services(
        repository: Arc<Repository>,
        source: Arc<dyn BookmarkSource>,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Arc<dyn TextSummarizer>,
        timeouts: Timeouts,
    ) -> Result<Self> {
        let sync_engine = SyncEngine::new(repository.clone(), source);
        let processor = Processor::new(repository.clone(), fetcher, summarizer, timeouts);
        let items = repository.list_items().await?;

        let (task_tx, task_rx) = mpsc::channel(1);

        Ok(Self {
            items,
            selected_index: 0,
            filter: ItemFilter::All,
            show_help: false,
            instructions_input_active: false,
            instructions_input: String::new(),
            status_message: None,
            last_failures: Vec::new(),
            busy: None,
            task_rx,
            task_tx,
            repository,
            sync_engine,
            processor,
        })
    }

    // Core operations

    pub async fn sync(&self) -> Result<SyncResult> {
        self.sync_engine.sync().await
    }

    pub async fn process(&self, selector: Selector, reprocess: bool) -> Result<ProcessResult> {
        self.processor.process(selector, reprocess).await
    }

    /// Like `process`, with instructions that replace the stored ones for this batch.
    pub async fn process_with(
        &self,
        selector: Selector,
        reprocess: bool,
        instructions: Option<String>,
    ) -> Result<ProcessResult> {
        self.processor
            .process_with(selector, reprocess, instructions)
            .await
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.repository.list_items().await
    }

    pub async fn delete_item(&self, id: i64) -> Result<()> {
        self.repository.delete_item(id).await
    }

    pub async fn get_settings(&self) -> Result<Settings> {
        self.repository.get_settings().await
    }

    pub async fn save_settings(&self, custom_instructions: String) -> Result<()> {
        self.repository
            .save_settings(Settings {
                custom_instructions,
            })
            .await
    }

    // Screen state

    pub fn filtered_items(&self) -> Vec<&Item> {
        self.items.iter().filter(|i| self.filter.matches(i)).collect()
    }

    pub fn selected_item(&self) -> Option<&Item> {
        let items = self.filtered_items();
        items.get(self.selected_index).copied()
    }

    pub fn processed_count(&self) -> usize {
        self.items.iter().filter(|i| i.processed).count()
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }

            AppAction::MoveDown => {
                let len = self.filtered_items().len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.filtered_items().len().saturating_sub(1);
            }

            AppAction::Sync => self.start_sync(),

            AppAction::ProcessUnprocessed => self.start_process(Selector::AllItems, false),

            AppAction::ReprocessAll => self.start_process(Selector::AllItems, true),

            AppAction::ReprocessSelected => {
                if let Some(id) = self.selected_item().map(|i| i.id) {
                    self.start_process(Selector::SingleItem(id), true);
                }
            }

            AppAction::DeleteItem => {
                if let Some(id) = self.selected_item().map(|i| i.id) {
                    match self.delete_item(id).await {
                        Ok(()) => {
                            self.items.retain(|i| i.id != id);
                            self.clamp_selection();
                            self.status_message = Some("Item deleted".to_string());
                        }
                        // The list on screen was stale
                        Err(e @ AppError::NotFound(_)) => {
                            tracing::warn!("Delete failed: {}", e);
                            self.status_message = Some(e.to_string());
                            self.reload_items().await?;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            AppAction::OpenInBrowser => {
                if let Some(item) = self.selected_item() {
                    let url = item.url.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::warn!("Failed to open {}: {}", url, e);
                    }
                }
            }

            AppAction::CycleFilter => {
                self.filter = self.filter.cycle();
                self.selected_index = 0;
            }

            AppAction::EditInstructions => {
                self.instructions_input = self.get_settings().await?.custom_instructions;
                self.instructions_input_active = true;
            }

            AppAction::InstructionsChar(c) => {
                self.instructions_input.push(c);
            }

            AppAction::InstructionsBackspace => {
                self.instructions_input.pop();
            }

            AppAction::InstructionsConfirm => {
                let text = std::mem::take(&mut self.instructions_input);
                self.save_settings(text).await?;
                self.instructions_input_active = false;
                self.status_message = Some("Settings updated".to_string());
            }

            AppAction::InstructionsCancel => {
                self.instructions_input_active = false;
                self.instructions_input.clear();
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_items().len();
        if len > 0 && self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    /// Only one background job runs at a time.
    fn start_sync(&mut self) {
        if self.busy.is_some() {
            return;
        }
        self.busy = Some("Syncing reading list...");

        let engine = self.sync_engine.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = engine.sync().await.map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::Sync(result)).await;
        });
    }

    fn start_process(&mut self, selector: Selector, reprocess: bool) {
        if self.busy.is_some() {
            return;
        }
        self.busy = Some("Processing items...");

        let processor = self.processor.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = processor
                .process(selector, reprocess)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(TaskResult::Process(result)).await;
        });
    }

    /// Poll for a finished background job (non-blocking)
    pub async fn poll_task_result(&mut self) -> Result<()> {
        let Ok(result) = self.task_rx.try_recv() else {
            return Ok(());
        };

        match result {
            TaskResult::Sync(Ok(sync)) => {
                self.status_message = Some(sync.message());
            }
            TaskResult::Process(Ok(process)) => {
                self.last_failures = process
                    .failed
                    .iter()
                    .map(|f| format!("#{} {}: {}", f.id, f.url, f.error))
                    .collect();
                self.status_message = Some(process.message);
            }
            TaskResult::Sync(Err(e)) | TaskResult::Process(Err(e)) => {
                tracing::error!("Background job failed: {}", e);
                self.status_message = Some(e);
            }
        }

        self.busy = None;
        self.reload_items().await
    }

    async fn reload_items(&mut self) -> Result<()> {
        self.items = self.repository.list_items().await?;
        self.clamp_selection();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stubs::{entry, memory_repo, StaticSource, StubFetcher, StubSummarizer};
    use std::time::Duration;

    async fn test_app(urls: &[&str]) -> App {
        let repo = memory_repo().await;
        let source = StaticSource::new(urls.iter().map(|u| entry(u, u)).collect());
        let pages: Vec<(&str, &str)> = urls.iter().map(|u| (*u, "body")).collect();
        App::with_services(
            repo,
            Arc::new(source),
            Arc::new(StubFetcher::with_pages(&pages)),
            Arc::new(StubSummarizer::returning("summary")),
            Timeouts {
                fetch: Duration::from_secs(5),
                summarize: Duration::from_secs(5),
            },
        )
        .await
        .unwrap()
    }

    async fn wait_for_task(app: &mut App) {
        while app.busy.is_some() {
            tokio::time::sleep(Duration::from_millis(5)).await;
            app.poll_task_result().await.unwrap();
        }
    }

    #[tokio::test]
    async fn sync_then_process_in_background() {
        let mut app = test_app(&["http://a.test", "http://b.test"]).await;
        assert!(app.items.is_empty());

        app.handle_action(AppAction::Sync).await.unwrap();
        wait_for_task(&mut app).await;
        assert_eq!(app.items.len(), 2);
        assert_eq!(app.status_message.as_deref(), Some("Synced 2 new items"));

        app.handle_action(AppAction::ProcessUnprocessed).await.unwrap();
        wait_for_task(&mut app).await;
        assert_eq!(app.processed_count(), 2);
        assert_eq!(app.status_message.as_deref(), Some("Processed 2 items"));
        assert!(app.last_failures.is_empty());
    }

    #[tokio::test]
    async fn delete_keeps_selection_in_range() {
        let mut app = test_app(&["http://a.test", "http://b.test"]).await;
        app.sync().await.unwrap();
        app.reload_items().await.unwrap();

        app.handle_action(AppAction::MoveToBottom).await.unwrap();
        assert_eq!(app.selected_index, 1);

        app.handle_action(AppAction::DeleteItem).await.unwrap();
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.list_items().await.unwrap().len(), 1);
        assert_eq!(app.selected_item().map(|i| i.url.as_str()), Some("http://a.test"));
    }

    #[tokio::test]
    async fn deleting_an_already_removed_item_keeps_the_session() {
        let mut app = test_app(&["http://a.test"]).await;
        app.sync().await.unwrap();
        app.reload_items().await.unwrap();
        let id = app.items[0].id;

        // Removed behind the screen's back, e.g. by `--delete` in another shell
        app.repository.delete_item(id).await.unwrap();

        let quit = app.handle_action(AppAction::DeleteItem).await.unwrap();
        assert!(!quit);
        assert!(app.items.is_empty());
        assert_eq!(app.selected_index, 0);
        assert_eq!(
            app.status_message.as_deref(),
            Some(format!("Item {id} not found").as_str())
        );
    }

    #[tokio::test]
    async fn instructions_override_applies_to_one_batch() {
        let repo = memory_repo().await;
        let summarizer = Arc::new(StubSummarizer::returning("summary"));
        let app = App::with_services(
            repo,
            Arc::new(StaticSource::new(vec![entry("http://a.test", "A")])),
            Arc::new(StubFetcher::with_pages(&[("http://a.test", "body")])),
            summarizer.clone(),
            Timeouts {
                fetch: Duration::from_secs(5),
                summarize: Duration::from_secs(5),
            },
        )
        .await
        .unwrap();
        app.save_settings("Stored".to_string()).await.unwrap();
        app.sync().await.unwrap();

        let result = app
            .process_with(Selector::AllItems, false, Some("Just one line".to_string()))
            .await
            .unwrap();
        assert_eq!(result.succeeded.len(), 1);
        assert_eq!(summarizer.instructions_seen(), vec!["Just one line".to_string()]);
        assert_eq!(app.get_settings().await.unwrap().custom_instructions, "Stored");

        app.process(Selector::AllItems, true).await.unwrap();
        assert_eq!(summarizer.instructions_seen().last().map(String::as_str), Some("Stored"));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let app = test_app(&["http://a.test"]).await;
        app.sync().await.unwrap();

        let result = app.delete_item(404).await;
        assert!(matches!(result, Err(AppError::NotFound(404))));
        assert_eq!(app.list_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filter_limits_visible_items() {
        let mut app = test_app(&["http://a.test", "http://b.test"]).await;
        app.sync().await.unwrap();
        let first = app.list_items().await.unwrap()[0].id;
        app.process(Selector::SingleItem(first), true).await.unwrap();
        app.reload_items().await.unwrap();

        app.handle_action(AppAction::CycleFilter).await.unwrap();
        assert_eq!(app.filter, ItemFilter::Unprocessed);
        assert_eq!(app.filtered_items().len(), 1);

        app.handle_action(AppAction::CycleFilter).await.unwrap();
        assert_eq!(app.filter, ItemFilter::Processed);
        assert_eq!(app.filtered_items()[0].id, first);
    }

    #[tokio::test]
    async fn instructions_popup_saves_settings() {
        let mut app = test_app(&[]).await;
        app.save_settings("Old".to_string()).await.unwrap();

        app.handle_action(AppAction::EditInstructions).await.unwrap();
        assert!(app.instructions_input_active);
        assert_eq!(app.instructions_input, "Old");

        app.handle_action(AppAction::InstructionsBackspace).await.unwrap();
        app.handle_action(AppAction::InstructionsBackspace).await.unwrap();
        app.handle_action(AppAction::InstructionsChar('k')).await.unwrap();
        app.handle_action(AppAction::InstructionsConfirm).await.unwrap();

        assert!(!app.instructions_input_active);
        assert_eq!(app.get_settings().await.unwrap().custom_instructions, "Ok");
    }
}
