//! Configuration service implementation.
//!
//! Loads the client configuration from `config.toml`
//! (`~/.config/taskdeck/config.toml` by default) and applies environment
//! overrides on top.

use crate::paths::TaskdeckPaths;
use std::fs;
use std::path::PathBuf;
use taskdeck_core::config::ClientConfig;
use taskdeck_core::error::{Result, TaskdeckError};

pub const API_URL_ENV: &str = "TASKDECK_API_URL";
pub const LOG_LEVEL_ENV: &str = "TASKDECK_LOG";

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Creates a service reading the default config file.
    pub fn new() -> Result<Self> {
        let path = TaskdeckPaths::config_file().map_err(|e| TaskdeckError::config(e.to_string()))?;
        Ok(Self { path })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Loads the configuration with environment overrides applied.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = self.load_file()?;
        Ok(apply_overrides(config, |key| std::env::var(key).ok()))
    }

    fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[Config] {} not found, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Applies `TASKDECK_*` overrides read through `lookup`.
pub fn apply_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
        config.api.base_url = url;
    }
    if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|level| !level.trim().is_empty()) {
        config.log.level = level;
    }
    config
}
