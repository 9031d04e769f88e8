//! Session-aware API client.
//!
//! Every authorized request goes through [`ApiClient::execute`], which attaches
//! the current credential and turns a 401 into a session invalidation. Task
//! and profile code never handles 401 itself.

use crate::session::SessionContext;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use taskdeck_core::gateway::{ApiRequest, GatewayError, RequestGateway};
use taskdeck_core::session::Credential;

#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<dyn RequestGateway>,
    session: Arc<SessionContext>,
}

impl ApiClient {
    pub fn new(gateway: Arc<dyn RequestGateway>, session: Arc<SessionContext>) -> Self {
        Self { gateway, session }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Sends an authorized request with the session's current credential.
    ///
    /// On a 401 the session is invalidated (storage cleared, navigation to
    /// login) before the error is returned.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let credential = self.session.credential();
        let result = self
            .gateway
            .send(request.with_credential(credential.clone()))
            .await;

        if result.as_ref().is_err_and(GatewayError::is_unauthorized) {
            match &credential {
                Some(used) => {
                    self.session.invalidate_if_current(used);
                }
                None => self.session.invalidate(),
            }
        }
        result
    }

    /// Sends a request with an explicit credential and no global 401 handling.
    ///
    /// Used while a session is being established (identity refresh, post-login
    /// identity fetch), where the caller owns the failure path.
    pub async fn execute_with(
        &self,
        request: ApiRequest,
        credential: &Credential,
    ) -> Result<Value, GatewayError> {
        self.gateway
            .send(request.with_credential(Some(credential.clone())))
            .await
    }

    /// Sends an anonymous request (login, registration).
    pub async fn execute_public(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        self.gateway.send(request.with_credential(None)).await
    }

    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, GatewayError> {
        decode(self.execute(request).await?)
    }

    pub async fn execute_with_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        credential: &Credential,
    ) -> Result<T, GatewayError> {
        decode(self.execute_with(request, credential).await?)
    }

    pub async fn execute_public_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, GatewayError> {
        decode(self.execute_public(request).await?)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
}
