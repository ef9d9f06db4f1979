use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_bookmarks_path")]
    pub bookmarks_path: String,

    pub claude_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub claude_model: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_summarize_timeout")]
    pub summarize_timeout_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reading-list");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("reading_list.db").to_string_lossy().to_string()
}

fn default_bookmarks_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Library/Safari/Bookmarks.plist")
        .to_string_lossy()
        .to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_summarize_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bookmarks_path: default_bookmarks_path(),
            claude_api_key: None,
            claude_model: default_model(),
            fetch_timeout_secs: default_fetch_timeout(),
            summarize_timeout_secs: default_summarize_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        Ok(config.with_env_overrides(
            std::env::var("SAFARI_BOOKMARKS_PATH").ok(),
            std::env::var("ANTHROPIC_API_KEY").ok(),
        ))
    }

    /// Bookmarks path from the environment wins; the API key from the
    /// environment only fills in a missing one.
    fn with_env_overrides(mut self, bookmarks_path: Option<String>, api_key: Option<String>) -> Self {
        if let Some(path) = bookmarks_path.filter(|p| !p.is_empty()) {
            self.bookmarks_path = path;
        }
        if self.claude_api_key.as_deref().map_or(true, str::is_empty) {
            self.claude_api_key = api_key.filter(|k| !k.is_empty());
        }
        self
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reading-list")
            .join("config.toml")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_secs(self.summarize_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str("claude_api_key = \"sk-test\"").unwrap();
        assert_eq!(config.claude_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.claude_model, DEFAULT_MODEL);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.summarize_timeout(), Duration::from_secs(120));
        assert!(config.bookmarks_path.ends_with("Bookmarks.plist"));
    }

    #[test]
    fn env_bookmarks_path_overrides_file() {
        let config = Config {
            bookmarks_path: "/from/file.plist".to_string(),
            ..Config::default()
        }
        .with_env_overrides(Some("/from/env.plist".to_string()), None);
        assert_eq!(config.bookmarks_path, "/from/env.plist");
    }

    #[test]
    fn env_api_key_only_fills_gaps() {
        let configured = Config {
            claude_api_key: Some("sk-file".to_string()),
            ..Config::default()
        }
        .with_env_overrides(None, Some("sk-env".to_string()));
        assert_eq!(configured.claude_api_key.as_deref(), Some("sk-file"));

        let missing = Config::default().with_env_overrides(None, Some("sk-env".to_string()));
        assert_eq!(missing.claude_api_key.as_deref(), Some("sk-env"));
    }
}
