//! In-memory credential store for tests and ephemeral clients.

use std::sync::Mutex;
use taskdeck_core::error::{Result, TaskdeckError};
use taskdeck_core::session::{CredentialStore, PersistedCredentials};
use taskdeck_core::user::Identity;

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: Mutex<Option<PersistedCredentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`, as if saved by a previous run.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Some(PersistedCredentials {
                token: Some(token.into()),
                user: None,
            })),
        }
    }

    /// Current stored token, if any.
    pub fn token(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.as_ref().and_then(|c| c.token.clone()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<PersistedCredentials>>> {
        self.inner
            .lock()
            .map_err(|e| TaskdeckError::internal(format!("credential store poisoned: {e}")))
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Result<Option<PersistedCredentials>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, token: &str, identity: Option<&Identity>) -> Result<()> {
        *self.lock()? = Some(PersistedCredentials {
            token: Some(token.to_string()),
            user: identity.cloned(),
        });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
