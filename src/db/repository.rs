use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Item, NewItem, Settings};

use super::schema::SCHEMA;

const ITEM_COLUMNS: &str = "id, url, title, preview_text, full_text, summary, processed, added_at, created_at, processed_at";
const CUSTOM_INSTRUCTIONS_KEY: &str = "custom_instructions";

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Item operations

    /// Inserts a new unprocessed item unless one with the same url exists.
    /// Returns the new id, or `None` when the url was already present.
    pub async fn insert_item(&self, item: NewItem) -> Result<Option<i64>> {
        let id = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    r#"INSERT INTO items (url, title, preview_text, added_at, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5)
                       ON CONFLICT(url) DO NOTHING"#,
                    params![
                        item.url,
                        item.title,
                        item.preview_text,
                        item.added_at.map(|dt| dt.to_rfc3339()),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                Ok((inserted > 0).then(|| conn.last_insert_rowid()))
            })
            .await?;
        Ok(id)
    }

    pub async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let item = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"))?;
                let item = stmt.query_row(params![id], item_from_row).optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// All items, ascending by id.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.query_items(format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .await
    }

    pub async fn list_unprocessed_items(&self) -> Result<Vec<Item>> {
        self.query_items(format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE processed = 0 ORDER BY id"
        ))
        .await
    }

    async fn query_items(&self, sql: String) -> Result<Vec<Item>> {
        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map([], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    /// Stores fetched text without touching `summary` or `processed`.
    pub async fn save_full_text(&self, id: i64, full_text: String) -> Result<()> {
        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE items SET full_text = ?1 WHERE id = ?2",
                    params![full_text, id],
                )?;
                Ok(updated)
            })
            .await?;
        ensure_found(id, updated)
    }

    pub async fn mark_processed(
        &self,
        id: i64,
        full_text: String,
        summary: String,
        processed_at: DateTime<Utc>,
    ) -> Result<()> {
        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    r#"UPDATE items
                       SET full_text = ?1, summary = ?2, processed = 1, processed_at = ?3
                       WHERE id = ?4"#,
                    params![full_text, summary, processed_at.to_rfc3339(), id],
                )?;
                Ok(updated)
            })
            .await?;
        ensure_found(id, updated)
    }

    pub async fn delete_item(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM items WHERE id = ?1", params![id])?;
                Ok(deleted)
            })
            .await?;
        ensure_found(id, deleted)
    }

    // Settings operations

    /// Missing rows read as defaults.
    pub async fn get_settings(&self) -> Result<Settings> {
        let value = self
            .conn
            .call(|conn| {
                let value: Option<Option<String>> = conn
                    .query_row(
                        "SELECT value FROM settings WHERE key = ?1",
                        params![CUSTOM_INSTRUCTIONS_KEY],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value.flatten())
            })
            .await?;
        Ok(Settings {
            custom_instructions: value.unwrap_or_default(),
        })
    }

    pub async fn save_settings(&self, settings: Settings) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO settings (key, value) VALUES (?1, ?2)
                       ON CONFLICT(key) DO UPDATE SET value = excluded.value"#,
                    params![CUSTOM_INSTRUCTIONS_KEY, settings.custom_instructions],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

fn ensure_found(id: i64, affected: usize) -> Result<()> {
    if affected == 0 {
        Err(AppError::NotFound(id))
    } else {
        Ok(())
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn required_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        preview_text: row.get(3)?,
        full_text: row.get(4)?,
        summary: row.get(5)?,
        processed: row.get::<_, i64>(6)? != 0,
        added_at: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| parse_datetime(&s)),
        created_at: required_datetime(row, 8)?,
        processed_at: row
            .get::<_, Option<String>>(9)?
            .and_then(|s| parse_datetime(&s)),
    })
}
