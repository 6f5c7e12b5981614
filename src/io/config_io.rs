use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "catalog.toml";

/// Environment variable overriding `[api] url`
pub const API_URL_ENV: &str = "CATALOG_API_URL";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load the config.
///
/// An explicit path must exist. Without one, `catalog.toml` in `dir` is used
/// when present and defaults otherwise. `CATALOG_API_URL` is applied on top.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    let mut config = match explicit {
        Some(path) => read_config(path)?,
        None => {
            let path = dir.join(CONFIG_FILE);
            if path.exists() {
                read_config(&path)?
            } else {
                Config::default()
            }
        }
    };
    apply_env(&mut config, std::env::var(API_URL_ENV).ok());
    Ok(config)
}

/// Parse a config file
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Apply environment overrides (empty values are ignored)
pub fn apply_env(config: &mut Config, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        config.api.url = url;
    }
}
