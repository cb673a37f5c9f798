//! Agent settings and configuration types.
//!
//! Settings are persisted to `~/.config/inbox-agent/settings.json` (or XDG
//! equivalent) and loaded at startup. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reading or writing the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("settings I/O error at {path}: {source}")]
    Io {
        /// Settings file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("invalid settings file {path}: {source}")]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Top-level agent settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Which classifier to run and where its model lives.
    pub classifier: ClassifierSettings,
    /// Post-classification actions.
    pub actions: ActionSettings,
    /// Digest delivery.
    pub notifications: NotificationSettings,
    /// Mailbox account.
    pub gmail: GmailSettings,
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults if the file does
    /// not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }
}

/// Classifier selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Ordered keyword rules.
    Rules,
    /// TF-IDF + logistic regression model.
    #[default]
    Learned,
}

/// Classifier configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Classifier used for unread mail.
    pub mode: ClassifierMode,
    /// Persisted model path. Defaults to the data directory.
    pub model_path: Option<PathBuf>,
}

/// Actions taken after classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Archive mail older than `archive_after_days`.
    pub archive_old: bool,
    /// Age threshold for archiving, in days.
    pub archive_after_days: u32,
    /// Star unread mail from key contacts.
    pub flag_key_contacts: bool,
    /// Sender substrings that mark a key contact (e.g. `boss@company.com`
    /// or a whole domain).
    pub key_contacts: Vec<String>,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            archive_old: true,
            archive_after_days: 30,
            flag_key_contacts: true,
            key_contacts: Vec::new(),
        }
    }
}

/// Daily digest delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Whether to send the digest at the end of a pass.
    pub enabled: bool,
    /// Slack channel ID. Overridden by the channel environment variable.
    pub slack_channel_id: Option<String>,
    /// Environment variable holding the Slack bot token.
    pub slack_token_env: String,
    /// Environment variable holding the Slack channel ID.
    pub slack_channel_env: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            slack_channel_id: None,
            slack_token_env: "SLACK_BOT_TOKEN".to_string(),
            slack_channel_env: "SLACK_CHANNEL_ID".to_string(),
        }
    }
}

/// Mailbox account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSettings {
    /// Account ID used to look up OAuth credentials in the keychain.
    pub account_id: String,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            account_id: "me".to_string(),
        }
    }
}
