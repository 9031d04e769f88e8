//! Storage layer for the persisted session credential.

pub mod atomic_json;
pub mod credential_storage;
pub mod memory;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use credential_storage::FileCredentialStore;
pub use memory::InMemoryCredentialStore;
