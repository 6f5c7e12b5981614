use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from catalog.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Collection API
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Dataset file served by `catalog serve`
    #[serde(default = "default_db")]
    pub db: String,
    /// Reload the dataset when the file changes on disk
    #[serde(default = "default_true")]
    pub watch: bool,
    /// Keep writes in memory only; the dataset file is never rewritten
    #[serde(default)]
    pub read_only: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            db: default_db(),
            watch: true,
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Initial page size of every list
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Page sizes cycled with `z`
    #[serde(default = "default_page_sizes")]
    pub page_sizes: Vec<usize>,
    /// Quiet period after the last keystroke before a search is sent
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Hex color overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            page_size: default_page_size(),
            page_sizes: default_page_sizes(),
            search_debounce_ms: default_search_debounce_ms(),
            colors: HashMap::new(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db() -> String {
    "db.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    10
}

fn default_page_sizes() -> Vec<usize> {
    vec![5, 10, 25]
}

fn default_search_debounce_ms() -> u64 {
    700
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.url, "http://localhost:3000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.server.port, 3000);
        assert!(config.server.watch);
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.page_sizes, vec![5, 10, 25]);
        assert_eq!(config.ui.search_debounce_ms, 700);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[server]
port = 4000

[ui]
search_debounce_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.db, "db.json");
        assert_eq!(config.ui.search_debounce_ms, 250);
        assert_eq!(config.ui.page_size, 10);
    }
}
