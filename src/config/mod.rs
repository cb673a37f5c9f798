//! Configuration and settings management.
//!
//! This module provides agent settings types and persistence, plus the
//! platform directories where settings and the classifier model live.

mod settings;

use std::path::PathBuf;

use directories::ProjectDirs;

pub use settings::{
    ActionSettings, ClassifierMode, ClassifierSettings, ConfigError, GmailSettings,
    NotificationSettings, Settings,
};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "panbanda", "inbox-agent")
}

/// Directory holding `settings.json`. Falls back to the current directory.
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding the persisted classifier model. Falls back to the
/// current directory.
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default settings file path.
pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}
