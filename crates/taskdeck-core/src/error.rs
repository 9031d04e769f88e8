//! Error types for taskdeck.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kind of task mutation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Toggle,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Toggle => "toggle",
            MutationKind::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// A shared error type for the entire taskdeck client.
///
/// The first group of variants is what callers see from session and task
/// operations. The second group covers the ambient layers (storage,
/// configuration, serialization).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskdeckError {
    /// Login was rejected by the server.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Registration was rejected by the server.
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    /// The API could not be reached.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server rejected the credential (401). The session has already been
    /// invalidated when this is returned.
    #[error("Session expired, please log in again")]
    AuthExpired,

    /// The server refused access to the resource (403).
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Fetching the task list failed; the previous list is kept.
    #[error("Failed to load tasks: {0}")]
    LoadError(String),

    /// A create/update/toggle/delete failed and was rolled back locally.
    #[error("Failed to {operation} task: {message}")]
    MutationFailed {
        operation: MutationKind,
        message: String,
    },

    /// Credential or config file storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaskdeckError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a MutationFailed error
    pub fn mutation(operation: MutationKind, message: impl Into<String>) -> Self {
        Self::MutationFailed {
            operation,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error was caused by an expired or rejected credential
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Check if this is a rolled-back mutation
    pub fn is_mutation_failure(&self) -> bool {
        matches!(self, Self::MutationFailed { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for TaskdeckError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for TaskdeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TaskdeckError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TaskdeckError>`.
pub type Result<T> = std::result::Result<T, TaskdeckError>;
