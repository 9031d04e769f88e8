//! Request gateway contract.
//!
//! The gateway is the REST transport the client core talks through. It is an
//! external collaborator: the core only depends on this trait, the HTTP
//! implementation lives in the infrastructure crate.

use crate::error::{MutationKind, TaskdeckError};
use crate::session::Credential;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ME_PATH: &str = "/me";
pub const TASKS_PATH: &str = "/tasks/";

pub fn task_path(id: &str) -> String {
    format!("/tasks/{id}/")
}

pub fn task_completion_path(id: &str) -> String {
    format!("/tasks/{id}/complete/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// One REST call: path relative to the API base, method, optional JSON body
/// and the credential to present, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub credential: Option<Credential>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            credential: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as the JSON request body.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, GatewayError> {
        let value =
            serde_json::to_value(body).map_err(|e| GatewayError::Encode(e.to_string()))?;
        Ok(self.with_body(value))
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

/// Transport-level failures, as reported by a [`RequestGateway`].
///
/// 401 and 403 are kept distinct from other statuses: a 401 invalidates the
/// session, a 403 is only surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Authentication failed (401): {0}")]
    Unauthorized(String),

    #[error("Access forbidden (403): {0}")]
    Forbidden(String),

    #[error("API request failed ({code}): {detail}")]
    Status { code: u16, detail: String },

    #[error("API unreachable: {0}")]
    Unreachable(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Server-supplied message, if the server answered at all.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Unauthorized(detail)
            | GatewayError::Forbidden(detail)
            | GatewayError::Status { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_))
    }

    // ============================================================================
    // Mapping into the caller-facing taxonomy
    // ============================================================================

    /// Login failures: any server answer is a credential rejection.
    pub fn into_login_error(self) -> TaskdeckError {
        self.into_form_error(TaskdeckError::InvalidCredentials, "Login failed")
    }

    /// Registration failures: the server's message is passed through.
    pub fn into_registration_error(self) -> TaskdeckError {
        self.into_form_error(TaskdeckError::RegistrationFailed, "Registration failed")
    }

    fn into_form_error(
        self,
        rejected: fn(String) -> TaskdeckError,
        fallback: &str,
    ) -> TaskdeckError {
        match self {
            GatewayError::Unreachable(message) => TaskdeckError::NetworkError(message),
            GatewayError::Encode(message) | GatewayError::Decode(message) => {
                TaskdeckError::Internal(message)
            }
            other => {
                let detail = other
                    .detail()
                    .filter(|detail| !detail.is_empty())
                    .unwrap_or(fallback)
                    .to_string();
                rejected(detail)
            }
        }
    }

    /// Failures of an authorized call made on behalf of the session.
    pub fn into_session_error(self) -> TaskdeckError {
        match self {
            GatewayError::Unauthorized(_) => TaskdeckError::AuthExpired,
            GatewayError::Forbidden(detail) => TaskdeckError::Forbidden(detail),
            GatewayError::Unreachable(message) => TaskdeckError::NetworkError(message),
            other => TaskdeckError::Internal(other.to_string()),
        }
    }

    /// Failures of `GET /tasks/`.
    pub fn into_load_error(self) -> TaskdeckError {
        match self {
            GatewayError::Unauthorized(_) => TaskdeckError::AuthExpired,
            GatewayError::Forbidden(detail) => TaskdeckError::Forbidden(detail),
            other => TaskdeckError::LoadError(other.to_string()),
        }
    }

    /// Failures of a task mutation.
    pub fn into_mutation_error(self, operation: MutationKind) -> TaskdeckError {
        match self {
            GatewayError::Unauthorized(_) => TaskdeckError::AuthExpired,
            GatewayError::Forbidden(detail) => TaskdeckError::Forbidden(detail),
            other => TaskdeckError::mutation(operation, other.to_string()),
        }
    }
}

/// The REST transport.
///
/// Implementations must:
/// - attach `Authorization: Bearer <token>` when `request.credential` is set
/// - report 401 as [`GatewayError::Unauthorized`] and 403 as
///   [`GatewayError::Forbidden`]
/// - return the parsed JSON body of a 2xx response (`Value::Null` when the
///   body is empty)
#[async_trait]
pub trait RequestGateway: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError>;
}
