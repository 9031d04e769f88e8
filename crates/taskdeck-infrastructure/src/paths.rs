//! Path management for taskdeck configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/taskdeck/          # Config directory (platform default via `dirs`)
//! ├── config.toml              # Client configuration
//! └── credentials.json         # Persisted bearer token + identity
//! ```
//!
//! `TASKDECK_CONFIG_DIR` overrides the directory.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "taskdeck";
const CONFIG_DIR_ENV: &str = "TASKDECK_CONFIG_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct TaskdeckPaths;

impl TaskdeckPaths {
    /// Returns the taskdeck configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/taskdeck/`)
    /// - `Err(PathError::ConfigDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path to `credentials.json`.
    ///
    /// # Security Note
    ///
    /// The file holds a live bearer token and is written with mode 600 on Unix.
    pub fn credentials_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("credentials.json"))
    }
}
