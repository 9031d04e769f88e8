//! Session domain model.
//!
//! The session is an enum whose variants carry exactly the data they are
//! allowed to carry: no identity without authentication, no credential
//! without at least an authentication in progress.

use crate::user::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticating {
        credential: Credential,
    },
    Authenticated {
        credential: Credential,
        identity: Identity,
    },
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        match self {
            Session::Unauthenticated => SessionStatus::Unauthenticated,
            Session::Authenticating { .. } => SessionStatus::Authenticating,
            Session::Authenticated { .. } => SessionStatus::Authenticated,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Session::Unauthenticated => None,
            Session::Authenticating { credential } | Session::Authenticated { credential, .. } => {
                Some(credential)
            }
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn identity_mut(&mut self) -> Option<&mut Identity> {
        match self {
            Session::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// What dependents observe: the session plus whether startup restoration is
/// still running.
///
/// `loading == true` means "not known yet", which views must not confuse with
/// "known to be logged out".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub loading: bool,
}

impl SessionSnapshot {
    /// The state before `initialize` has run.
    pub fn starting() -> Self {
        Self {
            session: Session::Unauthenticated,
            loading: true,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::starting()
    }
}
