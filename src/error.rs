use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error reading bookmarks: {0}")]
    Sync(String),

    #[error("Failed to fetch content: {0}")]
    Fetch(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Item {0} not found")]
    NotFound(i64),

    #[error("Processing aborted: {0}")]
    Processing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
