use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use plist::{Dictionary, Value};

use super::{BookmarkEntry, BookmarkSource};
use crate::error::{AppError, Result};

const READING_LIST_FOLDER: &str = "com.apple.ReadingList";

/// Safari keeps the Reading List as a folder inside `Bookmarks.plist`.
pub struct SafariReadingList {
    path: PathBuf,
}

impl SafariReadingList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BookmarkSource for SafariReadingList {
    fn entries(&self) -> Result<Vec<BookmarkEntry>> {
        if !self.path.exists() {
            return Err(AppError::Sync(format!(
                "Bookmarks file not found at {}",
                self.path.display()
            )));
        }

        let root = Value::from_file(&self.path).map_err(|e| AppError::Sync(e.to_string()))?;
        let root = root
            .as_dictionary()
            .ok_or_else(|| AppError::Sync("Bookmarks root is not a dictionary".to_string()))?;

        let mut entries = Vec::new();
        if let Some(children) = children_of(root) {
            collect_reading_list(children, &mut entries);
        }

        tracing::debug!("Read {} reading list entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }
}

fn children_of(node: &Dictionary) -> Option<&Vec<Value>> {
    node.get("Children").and_then(Value::as_array)
}

/// Walks bookmark folders depth-first looking for the reading list folder.
fn collect_reading_list(children: &[Value], entries: &mut Vec<BookmarkEntry>) {
    for node in children.iter().filter_map(Value::as_dictionary) {
        let title = node.get("Title").and_then(Value::as_string);
        if title == Some(READING_LIST_FOLDER) {
            if let Some(items) = children_of(node) {
                entries.extend(items.iter().filter_map(Value::as_dictionary).map(entry_from));
            }
        } else if let Some(nested) = children_of(node) {
            collect_reading_list(nested, entries);
        }
    }
}

fn entry_from(node: &Dictionary) -> BookmarkEntry {
    let reading_list = node.get("ReadingList").and_then(Value::as_dictionary);

    BookmarkEntry {
        url: node
            .get("URLString")
            .and_then(Value::as_string)
            .unwrap_or_default()
            .trim()
            .to_string(),
        title: node
            .get("URIDictionary")
            .and_then(Value::as_dictionary)
            .and_then(|d| d.get("title"))
            .and_then(Value::as_string)
            .and_then(non_empty),
        preview_text: reading_list
            .and_then(|d| d.get("PreviewText"))
            .and_then(Value::as_string)
            .and_then(non_empty),
        added_at: reading_list
            .and_then(|d| d.get("DateAdded"))
            .and_then(Value::as_date)
            .map(|date| DateTime::<Utc>::from(SystemTime::from(date))),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
