//! File-backed credential store (`credentials.json`).

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use crate::paths::TaskdeckPaths;
use std::path::PathBuf;
use taskdeck_core::error::{Result, TaskdeckError};
use taskdeck_core::session::{CredentialStore, PersistedCredentials};
use taskdeck_core::user::Identity;

impl From<AtomicJsonError> for TaskdeckError {
    fn from(err: AtomicJsonError) -> Self {
        match err {
            AtomicJsonError::JsonError(e) => e.into(),
            other => TaskdeckError::storage(other.to_string()),
        }
    }
}

/// Persists the session credential to a JSON file.
///
/// Responsibilities:
/// - Write token and identity together in one atomic replace
/// - Remove both together on clear
///
/// Does NOT:
/// - Validate or refresh the token
/// - Encrypt anything (plaintext JSON, mode 600 on Unix)
pub struct FileCredentialStore {
    file: AtomicJsonFile<PersistedCredentials>,
}

impl FileCredentialStore {
    /// Creates a store at the default location (`~/.config/taskdeck/credentials.json`).
    pub fn new() -> Result<Self> {
        let path = TaskdeckPaths::credentials_file()
            .map_err(|e| TaskdeckError::storage(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a store at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<PersistedCredentials>> {
        let loaded = self.file.load()?;
        Ok(loaded.filter(|credentials| !credentials.is_empty()))
    }

    fn save(&self, token: &str, identity: Option<&Identity>) -> Result<()> {
        let credentials = PersistedCredentials {
            token: Some(token.to_string()),
            user: identity.cloned(),
        };
        self.file.save(&credentials)?;
        tracing::debug!("[CredentialStore] Saved credentials to {}", self.path().display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.file.remove()?;
        tracing::debug!("[CredentialStore] Cleared {}", self.path().display());
        Ok(())
    }
}
