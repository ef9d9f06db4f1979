mod safari;

use chrono::{DateTime, Utc};

use crate::error::Result;

pub use safari::SafariReadingList;

/// One saved page as reported by a bookmarks file.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkEntry {
    pub url: String,
    pub title: Option<String>,
    pub preview_text: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

/// Anything that can enumerate saved pages. Reading is all-or-nothing: an
/// unreadable or malformed source yields `AppError::Sync` and no entries.
pub trait BookmarkSource: Send + Sync {
    fn entries(&self) -> Result<Vec<BookmarkEntry>>;
}
