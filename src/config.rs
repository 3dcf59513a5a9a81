use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::ordering::{SortDirection, SortField, SortSpec};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// API origin, e.g. `https://newsapi.example.com`
    pub base_url: String,
    /// Static credential sent as the `apiKey` query parameter
    pub news_api_key: String,
    #[serde(default = "default_source")]
    pub default_source: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub default_sort: SortConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SortConfig {
    #[serde(default = "default_sort_field")]
    pub field: String,
    #[serde(default = "default_sort_direction")]
    pub direction: i64,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: default_sort_field(),
            direction: default_sort_direction(),
        }
    }
}

fn default_source() -> String {
    "reddit-r-all".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_sort_field() -> String {
    "Time".to_string()
}

fn default_sort_direction() -> i64 {
    1
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        // Fail at load time rather than on the first sort
        config.sort_spec()?;
        Ok(config)
    }

    /// Replace file values with `NEWS_API_KEY` / `NEWS_BASE_URL` when set.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            self.news_api_key = key;
        }
        if let Ok(url) = std::env::var("NEWS_BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sort_spec(&self) -> anyhow::Result<SortSpec> {
        let field: SortField = self.default_sort.field.parse()?;
        let direction = SortDirection::try_from(self.default_sort.direction)?;
        Ok(SortSpec::new(field, direction))
    }
}
