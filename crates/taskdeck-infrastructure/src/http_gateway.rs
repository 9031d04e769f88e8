//! HttpGateway - reqwest implementation of the request gateway.
//!
//! Talks JSON to the to-do REST API. Status handling:
//! - 2xx: parsed body (`null` when empty)
//! - 401: `Unauthorized`, 403: `Forbidden`
//! - anything else: `Status` with the server's `detail` when it sent one

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use taskdeck_core::config::ApiSettings;
use taskdeck_core::error::{Result, TaskdeckError};
use taskdeck_core::gateway::{ApiRequest, GatewayError, Method, RequestGateway};

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a gateway from the `[api]` settings.
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| TaskdeckError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, &settings.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn send(&self, request: ApiRequest) -> std::result::Result<Value, GatewayError> {
        let url = self.url(&request.path);
        tracing::debug!("[HttpGateway] {} {}", request.method.as_str(), url);

        let mut builder = self
            .client
            .request(Self::method(request.method), &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(credential) = &request.credential {
            let value = HeaderValue::from_str(&credential.bearer())
                .map_err(|e| GatewayError::Encode(format!("invalid credential header: {e}")))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            tracing::warn!("[HttpGateway] {} {} failed: {}", request.method.as_str(), url, err);
            GatewayError::Unreachable(err.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Unreachable(format!("failed to read response body: {e}")))?;

        interpret_response(status, &text)
    }
}

/// Maps a status code and raw body to the gateway result.
fn interpret_response(status: StatusCode, body: &str) -> std::result::Result<Value, GatewayError> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()));
    }

    let detail = extract_detail(status, body);
    tracing::debug!("[HttpGateway] {} {}", status.as_u16(), detail);

    match status {
        StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized(detail)),
        StatusCode::FORBIDDEN => Err(GatewayError::Forbidden(detail)),
        other => Err(GatewayError::Status {
            code: other.as_u16(),
            detail,
        }),
    }
}

/// Pulls the server's error message out of a response body.
///
/// Understands `{"detail": "..."}`, validation-style `{"detail": [{"msg": ...}]}`
/// and `{"message": "..."}`. Falls back to the status reason phrase.
fn extract_detail(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string()
    };

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    match value.get("detail").or_else(|| value.get("message")) {
        Some(Value::String(detail)) => detail.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                fallback()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback(),
    }
}
