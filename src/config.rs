//! Runtime configuration for the search pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_SEARCH_PATH: &str = "search/repositories";
pub const DEFAULT_PAGE_SIZE: u32 = 40;
pub const DEFAULT_PREFETCH_DISTANCE: usize = 20;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_CONTINUATION_CAPACITY: usize = 128;
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 12;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub search_path: String,
    /// `per_page` of continuation pages
    pub page_size: u32,
    /// `per_page` of the first page
    pub initial_load_size: u32,
    pub prefetch_distance: usize,
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub continuation_capacity: usize,
    pub workers: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub token: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            initial_load_size: DEFAULT_PAGE_SIZE,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            continuation_capacity: DEFAULT_CONTINUATION_CAPACITY,
            workers: DEFAULT_WORKERS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            user_agent: concat!("pagesearch/", env!("CARGO_PKG_VERSION")).to_string(),
            token: None,
        }
    }
}

impl SearchConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill `token` from `GITHUB_TOKEN` when not configured.
    pub fn with_env_token(mut self) -> Self {
        if self.token.is_none() {
            self.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.initial_load_size == 0 {
            return Err(ConfigError::Invalid("page sizes must be positive".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be positive".into()));
        }
        if self.continuation_capacity == 0 {
            return Err(ConfigError::Invalid(
                "continuation_capacity must be positive".into(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Full search endpoint, e.g. `https://api.github.com/search/repositories`.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size, 40);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.continuation_capacity, 128);
        assert_eq!(config.workers, 3);
        assert_eq!(config.connect_timeout(), Duration::from_secs(12));
        assert_eq!(config.read_timeout(), Duration::from_secs(24));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let mut config = SearchConfig::default();
        assert_eq!(config.endpoint(), "https://api.github.com/search/repositories");

        config.base_url = "http://127.0.0.1:8080/".to_string();
        config.search_path = "/search".to_string();
        assert_eq!(config.endpoint(), "http://127.0.0.1:8080/search");
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"page_size": 25, "debounce_ms": 400}}"#).unwrap();

        let config = SearchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.debounce_ms, 400);
        // Untouched fields keep their defaults
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"workers": 0}}"#).unwrap();

        assert!(matches!(
            SearchConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_file_reports_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();

        assert!(matches!(
            SearchConfig::from_file(file.path()),
            Err(ConfigError::Json(_))
        ));
    }
}
