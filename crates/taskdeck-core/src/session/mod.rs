//! Session domain module.

pub mod event;
pub mod model;
pub mod repository;

pub use event::{ClientEvent, Notification, Route};
pub use model::{Credential, Session, SessionSnapshot, SessionStatus};
pub use repository::{CredentialStore, PersistedCredentials};
