//! Shared session state.
//!
//! `SessionContext` is the single owner of the in-memory session and the only
//! writer of the credential store. The session lives inside a
//! `tokio::sync::watch` channel so that every update is observable by
//! subscribers the moment it is made, and so that reads and writes are
//! synchronous.
//!
//! Every change of the credential in force (login, logout, invalidation)
//! advances the session epoch. State derived from a session, such as the task
//! collection, records the epoch it was built under and is discarded once the
//! epoch moves on.

use crate::events::EventBus;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use taskdeck_core::error::Result;
use taskdeck_core::session::{
    Credential, CredentialStore, Route, Session, SessionSnapshot,
};
use taskdeck_core::user::{Identity, IdentityPatch};
use tokio::sync::watch;

pub struct SessionContext {
    state: watch::Sender<SessionSnapshot>,
    store: Arc<dyn CredentialStore>,
    events: EventBus,
    epoch: AtomicU64,
}

impl SessionContext {
    /// Creates the context in its startup state (unauthenticated, loading).
    pub fn new(store: Arc<dyn CredentialStore>, events: EventBus) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::starting());
        Self {
            state,
            store,
            events,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// The credential outbound requests should carry right now.
    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().session.credential().cloned()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().session.identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().session.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    fn set_session(&self, session: Session) {
        self.state.send_modify(|snapshot| {
            if snapshot.session.credential() != session.credential() {
                self.epoch.fetch_add(1, Ordering::SeqCst);
            }
            snapshot.session = session;
        });
    }

    pub(crate) fn finish_loading(&self) {
        self.state.send_if_modified(|snapshot| {
            let changed = snapshot.loading;
            snapshot.loading = false;
            changed
        });
    }

    /// A token has been obtained but the identity is not known yet.
    pub(crate) fn begin_authentication(&self, credential: Credential) {
        self.set_session(Session::Authenticating { credential });
    }

    /// Persists and publishes an authenticated session.
    ///
    /// Storage is written first; if that fails the in-memory session is reset
    /// so memory and disk never disagree about who is logged in.
    pub(crate) fn establish(&self, credential: Credential, identity: Identity) -> Result<()> {
        if let Err(err) = self.store.save(credential.token(), Some(&identity)) {
            tracing::error!("[Session] Failed to persist credential: {}", err);
            self.clear();
            return Err(err);
        }
        self.set_session(Session::Authenticated {
            credential,
            identity,
        });
        Ok(())
    }

    /// Drops the session and the persisted credential. No navigation.
    pub(crate) fn clear(&self) {
        self.set_session(Session::Unauthenticated);
        if let Err(err) = self.store.clear() {
            tracing::warn!("[Session] Failed to clear persisted credential: {}", err);
        }
    }

    /// Ends the session and sends the user to the login view.
    ///
    /// The in-memory session is cleared before anything else so that no
    /// request issued afterwards can pick up the old credential.
    pub fn invalidate(&self) {
        self.clear();
        self.events.navigate(Route::Login);
    }

    /// Invalidates the session if it is still the one `used` belongs to.
    ///
    /// A 401 for a credential that has since been replaced (the user logged in
    /// again while the request was in flight) must not end the new session.
    pub(crate) fn invalidate_if_current(&self, used: &Credential) -> bool {
        let current = self.credential();
        if current.as_ref() != Some(used) {
            tracing::debug!("[Session] Ignoring 401 for a superseded credential");
            return false;
        }
        tracing::info!("[Session] Credential rejected by server, invalidating session");
        self.invalidate();
        true
    }

    /// Merges profile fields into the current identity.
    ///
    /// Credential and status are untouched. Returns the merged identity, or
    /// `None` when nobody is authenticated.
    pub(crate) fn merge_identity(&self, patch: &IdentityPatch) -> Option<Identity> {
        let mut merged = None;
        self.state.send_if_modified(|snapshot| match snapshot.session.identity_mut() {
            Some(identity) => {
                identity.merge(patch);
                merged = Some(identity.clone());
                true
            }
            None => false,
        });

        let identity = merged?;
        if let Some(credential) = self.credential() {
            if let Err(err) = self.store.save(credential.token(), Some(&identity)) {
                tracing::warn!("[Session] Failed to persist updated identity: {}", err);
            }
        }
        Some(identity)
    }
}
