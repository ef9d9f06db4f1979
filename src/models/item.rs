use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub preview_text: Option<String>,
    pub full_text: Option<String>,
    pub summary: Option<String>,
    pub processed: bool,
    pub added_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Title for display, falling back to the url.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

/// An item as produced by sync, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub url: String,
    pub title: Option<String>,
    pub preview_text: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

/// Which items a processing batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    SingleItem(i64),
    AllItems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemFilter {
    #[default]
    All,
    Unprocessed,
    Processed,
}

impl ItemFilter {
    pub fn cycle(self) -> Self {
        match self {
            ItemFilter::All => ItemFilter::Unprocessed,
            ItemFilter::Unprocessed => ItemFilter::Processed,
            ItemFilter::Processed => ItemFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemFilter::All => "All",
            ItemFilter::Unprocessed => "Unprocessed",
            ItemFilter::Processed => "Processed",
        }
    }

    pub fn matches(self, item: &Item) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::Unprocessed => !item.processed,
            ItemFilter::Processed => item.processed,
        }
    }
}
