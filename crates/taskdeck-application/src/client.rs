//! Composition root.
//!
//! `TaskdeckClient` wires one session, one API client and one task
//! synchronizer together and hands the view layer the event receiver. There is
//! no global state: every consumer gets the client (or one of its parts)
//! passed in.

use crate::api_client::ApiClient;
use crate::events::EventBus;
use crate::session::{SessionContext, SessionManager};
use crate::task_synchronizer::TaskSynchronizer;
use std::sync::Arc;
use taskdeck_core::config::{ClientConfig, SessionSettings};
use taskdeck_core::error::Result;
use taskdeck_core::gateway::RequestGateway;
use taskdeck_core::session::{ClientEvent, CredentialStore, SessionStatus};
use taskdeck_infrastructure::{FileCredentialStore, HttpGateway};
use tokio::sync::mpsc::UnboundedReceiver;

pub struct TaskdeckClient {
    session: SessionManager,
    tasks: TaskSynchronizer,
}

impl TaskdeckClient {
    /// Builds a client over the given transport and credential store.
    ///
    /// # Returns
    ///
    /// The client and the receiver of its navigation and notification events.
    pub fn new(
        gateway: Arc<dyn RequestGateway>,
        store: Arc<dyn CredentialStore>,
        settings: &SessionSettings,
    ) -> (Self, UnboundedReceiver<ClientEvent>) {
        let (events, receiver) = EventBus::channel();
        let context = Arc::new(SessionContext::new(store, events.clone()));
        let api = ApiClient::new(gateway, context.clone());

        let client = Self {
            session: SessionManager::new(api.clone(), context, settings),
            tasks: TaskSynchronizer::new(api, events),
        };
        (client, receiver)
    }

    /// Builds a client talking HTTP to `config.api` and persisting the
    /// credential in the default `credentials.json`.
    pub fn from_config(config: &ClientConfig) -> Result<(Self, UnboundedReceiver<ClientEvent>)> {
        let gateway = Arc::new(HttpGateway::new(&config.api)?);
        let store = Arc::new(FileCredentialStore::new()?);
        tracing::debug!(
            "[Client] API {} / credentials {}",
            gateway.base_url(),
            store.path().display()
        );
        Ok(Self::new(gateway, store, &config.session))
    }

    /// Restores the persisted session and, when authenticated, loads tasks.
    ///
    /// A task load failure is recorded on the synchronizer and does not fail
    /// startup.
    pub async fn start(&self) -> SessionStatus {
        let status = self.session.initialize().await;
        if status == SessionStatus::Authenticated {
            if let Err(err) = self.tasks.load_all().await {
                tracing::warn!("[Client] Initial task load failed: {}", err);
            }
        }
        status
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn tasks(&self) -> &TaskSynchronizer {
        &self.tasks
    }

    /// Logs out. The previous user's tasks go with the session, the same way
    /// they do when the server rejects the credential.
    pub fn logout(&self) {
        self.session.logout();
    }

    /// Drops in-memory state. The persisted credential is left in place so
    /// the next start can restore it.
    pub async fn shutdown(self) {
        tracing::debug!("[Client] Shutting down");
        self.tasks.clear().await;
    }
}
