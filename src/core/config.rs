//! Configuration: bundled defaults, optional `config.json`, and environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::paths;
use crate::core::rules::DEFAULT_SKIP_TAGS;
use crate::core::watcher::{MessageSelector, SelectorError};

/// Env var: id of the element holding the chat messages.
pub const ENV_CONTAINER_ID: &str = "CHAT_MATH_CONTAINER_ID";
/// Env var: selector for message elements (e.g. `div.message`).
pub const ENV_MESSAGE_SELECTOR: &str = "CHAT_MATH_MESSAGE_SELECTOR";
/// Env var: comma-separated tags whose text is never rewritten.
pub const ENV_SKIP_TAGS: &str = "CHAT_MATH_SKIP_TAGS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub container_id: String,
    pub message_selector: MessageSelector,
    pub skip_tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid message selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("Container id cannot be empty")]
    EmptyContainerId,
}

/// On-disk shape. Every field is optional; later layers override earlier ones.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    container_id: Option<String>,
    message_selector: Option<String>,
    skip_tags: Option<Vec<String>>,
}

impl ConfigFile {
    fn merge(&mut self, other: ConfigFile) {
        if other.container_id.is_some() {
            self.container_id = other.container_id;
        }
        if other.message_selector.is_some() {
            self.message_selector = other.message_selector;
        }
        if other.skip_tags.is_some() {
            self.skip_tags = other.skip_tags;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(ENV_CONTAINER_ID) {
            self.container_id = Some(id);
        }
        if let Some(sel) = lookup(ENV_MESSAGE_SELECTOR) {
            self.message_selector = Some(sel);
        }
        if let Some(tags) = lookup(ENV_SKIP_TAGS) {
            self.skip_tags = Some(
                tags.split(',')
                    .map(|t| t.trim().to_ascii_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect(),
            );
        }
    }

    fn build(self) -> Result<Config, ConfigError> {
        let container_id = self.container_id.unwrap_or_default().trim().to_string();
        if container_id.is_empty() {
            return Err(ConfigError::EmptyContainerId);
        }
        let message_selector = self
            .message_selector
            .unwrap_or_default()
            .parse::<MessageSelector>()?;
        let skip_tags = self
            .skip_tags
            .unwrap_or_else(|| DEFAULT_SKIP_TAGS.iter().map(|t| t.to_string()).collect());
        Ok(Config {
            container_id,
            message_selector,
            skip_tags,
        })
    }
}

/// Defaults bundled from `config/defaults.json` (validated by build.rs).
fn bundled_defaults() -> ConfigFile {
    let json = include_str!("../../config/defaults.json");
    serde_json::from_str(json).expect("defaults.json must be valid")
}

/// Path of the user config file (`~/.config/chat-math-normalizer/config.json`).
pub fn config_path() -> Option<PathBuf> {
    paths::config_dir().map(|d| d.join("config.json"))
}

/// Load configuration from the default config path and the process environment.
pub fn load() -> Result<Config, ConfigError> {
    load_from(config_path().as_deref(), |key| env::var(key).ok())
}

/// Load configuration from `path` (skipped when absent) and `lookup` for env overrides.
pub fn load_from(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut file = bundled_defaults();
    if let Some(path) = path
        && path.exists()
    {
        let content = fs::read_to_string(path)?;
        let user: ConfigFile = serde_json::from_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        file.merge(user);
    }
    file.apply_env(lookup);
    file.build()
}
