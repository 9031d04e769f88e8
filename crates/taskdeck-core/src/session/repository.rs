//! Credential store trait.
//!
//! Defines the interface for persisting the bearer credential and the
//! identity it belongs to across restarts.

use crate::error::Result;
use crate::user::Identity;
use serde::{Deserialize, Serialize};

/// What survives a restart: the token and the last known identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl PersistedCredentials {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Durable storage for the session credential.
///
/// Only the session layer writes through this trait. Operations are
/// synchronous so that logout can clear storage before any other request is
/// issued.
///
/// # Implementation Notes
///
/// - `save` writes token and identity together.
/// - `clear` removes both keys together and succeeds when nothing is stored.
pub trait CredentialStore: Send + Sync {
    /// Loads the persisted credentials.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))`: Something is stored
    /// - `Ok(None)`: Nothing is stored
    /// - `Err(_)`: Storage could not be read or parsed
    fn load(&self) -> Result<Option<PersistedCredentials>>;

    /// Persists a token and, when known, its identity.
    fn save(&self, token: &str, identity: Option<&Identity>) -> Result<()>;

    /// Removes the token and identity.
    fn clear(&self) -> Result<()>;
}
