use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::config_error::ConfigError;

const DEFAULT_MESSAGE: &str = "Alarm: an unknown face has been detected.";

/// Credentials and text for the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushConfig {
    pub token: String,
    pub chat_id: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_message")]
    pub message: String,
    /// Locks the file against edits from the control surface.
    #[serde(default)]
    pub read_only: bool,
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

impl PushConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes the config, unless the file on disk is marked read-only.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if path.exists() && Self::load(path)?.read_only {
            return Err(ConfigError::ReadOnly(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("push token is empty".into()));
        }
        let chat_id = self.chat_id.trim();
        if chat_id.is_empty() {
            return Err(ConfigError::Invalid("push chat id is empty".into()));
        }
        let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(format!(
                "push chat id must be numeric, got {chat_id:?}"
            )));
        }
        if self.message.trim().is_empty() {
            return Err(ConfigError::Invalid("push message is empty".into()));
        }
        Ok(())
    }

    /// Proxy URL, treating an empty string as none.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
