pub const SCHEMA: &str = r#"
-- items table
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT,
    preview_text TEXT,
    full_text TEXT,
    summary TEXT,
    processed INTEGER NOT NULL DEFAULT 0,
    added_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    processed_at TEXT,
    CHECK (processed = 0 OR (summary IS NOT NULL AND summary <> ''))
);

CREATE INDEX IF NOT EXISTS idx_items_processed ON items(processed);

-- settings table (key/value, one row per setting)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;
