use super::context::SessionContext;
use crate::api_client::ApiClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use taskdeck_core::config::SessionSettings;
use taskdeck_core::error::{Result, TaskdeckError};
use taskdeck_core::gateway::{ApiRequest, GatewayError, LOGIN_PATH, ME_PATH, REGISTER_PATH};
use taskdeck_core::session::{Credential, Route, SessionSnapshot, SessionStatus};
use taskdeck_core::user::{Identity, IdentityPatch};
use tokio::sync::watch;

/// Body of `POST /auth/login` and `POST /auth/register`.
#[derive(Serialize)]
struct AuthForm<'a> {
    email: &'a str,
    password: &'a str,
}

/// Token response. Some servers include the identity, others only the token.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user: Option<Identity>,
}

/// Owns the session lifecycle: startup restoration, login, registration,
/// logout and profile updates.
///
/// `SessionManager` is responsible for:
/// - Restoring a persisted credential on startup (`initialize`)
/// - Exchanging credentials for a token and publishing the new session
/// - Ending the session and emitting the navigation that follows
/// - Keeping the persisted identity in step with profile edits
///
/// Every state change is published through the [`SessionContext`] watch
/// channel before any navigation event of the same action is emitted.
pub struct SessionManager {
    api: ApiClient,
    context: Arc<SessionContext>,
    refresh_retry_delay: Duration,
}

impl SessionManager {
    pub fn new(api: ApiClient, context: Arc<SessionContext>, settings: &SessionSettings) -> Self {
        Self {
            api,
            context,
            refresh_retry_delay: settings.refresh_retry_delay(),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Restores the persisted session, if any.
    ///
    /// With a stored token the identity is refreshed via `GET /me`. A 401 is
    /// retried once after a short delay; any failure after that clears the
    /// stored credential and leaves the session unauthenticated. No
    /// navigation is emitted. `loading` is false once this returns.
    pub async fn initialize(&self) -> SessionStatus {
        if let Some(credential) = self.stored_credential() {
            self.context.begin_authentication(credential.clone());

            match self.refresh_identity(&credential).await {
                Ok(identity) if self.is_current(&credential) => {
                    if let Err(err) = self.context.establish(credential, identity) {
                        tracing::warn!("[Session] Restored session could not be persisted: {}", err);
                    } else {
                        tracing::info!("[Session] Restored persisted session");
                    }
                }
                Ok(_) => {
                    tracing::debug!("[Session] Session changed during restoration, discarding")
                }
                Err(err) => {
                    tracing::info!("[Session] Stored credential rejected: {}", err);
                    if self.is_current(&credential) {
                        self.context.clear();
                    }
                }
            }
        }

        self.context.finish_loading();
        self.context.snapshot().status()
    }

    /// Logs in with email and password.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` when the server rejects the login (carrying the
    ///   server's message when it sent one)
    /// - `NetworkError` when the API could not be reached
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate(LOGIN_PATH, email, password, GatewayError::into_login_error)
            .await
    }

    /// Creates an account and logs in with it.
    ///
    /// # Errors
    ///
    /// - `RegistrationFailed` with the server's message
    /// - `NetworkError` when the API could not be reached
    pub async fn register(&self, email: &str, password: &str) -> Result<Identity> {
        self.authenticate(
            REGISTER_PATH,
            email,
            password,
            GatewayError::into_registration_error,
        )
        .await
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
        map_err: fn(GatewayError) -> TaskdeckError,
    ) -> Result<Identity> {
        let request = ApiRequest::post(path)
            .with_json(&AuthForm { email, password })
            .map_err(map_err)?;
        let response: TokenResponse = self
            .api
            .execute_public_json(request)
            .await
            .map_err(map_err)?;

        if response.access_token.is_empty() {
            return Err(TaskdeckError::internal("server returned an empty access token"));
        }
        let credential = Credential::new(response.access_token);

        let identity = match response.user {
            Some(identity) => identity,
            None => {
                self.context.begin_authentication(credential.clone());
                match self.fetch_identity(&credential).await {
                    Ok(identity) => identity,
                    Err(err) => {
                        if self.is_current(&credential) {
                            self.context.clear();
                        }
                        return Err(map_err(err));
                    }
                }
            }
        };

        self.context.establish(credential, identity.clone())?;
        self.context.finish_loading();
        tracing::info!("[Session] Authenticated as {}", identity.email);

        self.context.events().navigate(Route::Dashboard);
        Ok(identity)
    }

    /// Ends the session.
    ///
    /// Storage and the in-memory session are cleared before this returns, so
    /// no later request can carry the old credential. Emits `Navigate(Login)`.
    pub fn logout(&self) {
        tracing::info!("[Session] Logging out");
        self.context.invalidate();
    }

    /// Merges server-confirmed profile fields into the current identity.
    ///
    /// Returns `None` when nobody is logged in.
    pub fn update_identity(&self, patch: &IdentityPatch) -> Option<Identity> {
        self.context.merge_identity(patch)
    }

    /// Sends a profile edit (`PUT /me`) and merges what the server confirmed.
    pub async fn save_profile(&self, patch: &IdentityPatch) -> Result<Identity> {
        let request = ApiRequest::put(ME_PATH)
            .with_json(patch)
            .map_err(GatewayError::into_session_error)?;
        let confirmed: Identity = self
            .api
            .execute_json(request)
            .await
            .map_err(GatewayError::into_session_error)?;

        let confirmed_patch = IdentityPatch {
            name: confirmed.name.clone(),
            username: confirmed.username.clone(),
            email: Some(confirmed.email.clone()),
        };
        Ok(self.update_identity(&confirmed_patch).unwrap_or(confirmed))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.context.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.context.subscribe()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.context.credential()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.context.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.context.is_loading()
    }

    fn stored_credential(&self) -> Option<Credential> {
        let stored = match self.context.store().load() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!("[Session] Persisted credential unreadable, discarding: {}", err);
                self.context.clear();
                None
            }
        };
        stored
            .and_then(|stored| stored.token)
            .filter(|token| !token.is_empty())
            .map(Credential::new)
    }

    fn is_current(&self, credential: &Credential) -> bool {
        self.context.credential().as_ref() == Some(credential)
    }

    async fn fetch_identity(&self, credential: &Credential) -> std::result::Result<Identity, GatewayError> {
        self.api
            .execute_with_json(ApiRequest::get(ME_PATH), credential)
            .await
    }

    /// `GET /me` with a single delayed retry on 401.
    async fn refresh_identity(
        &self,
        credential: &Credential,
    ) -> std::result::Result<Identity, GatewayError> {
        match self.fetch_identity(credential).await {
            Err(GatewayError::Unauthorized(detail)) => {
                tracing::debug!(
                    "[Session] Identity refresh got 401 ({}), retrying in {:?}",
                    detail,
                    self.refresh_retry_delay
                );
                tokio::time::sleep(self.refresh_retry_delay).await;
                self.fetch_identity(credential).await
            }
            other => other,
        }
    }
}
