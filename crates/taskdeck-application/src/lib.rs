//! Application layer for taskdeck.
//!
//! Coordinates the domain models with a request gateway and a credential
//! store: the session manager, the session-aware API client and the task
//! synchronizer.

pub mod api_client;
pub mod client;
pub mod events;
pub mod session;
pub mod task_synchronizer;

#[cfg(test)]
mod testing;

pub use api_client::ApiClient;
pub use client::TaskdeckClient;
pub use events::EventBus;
pub use session::{SessionContext, SessionManager};
pub use task_synchronizer::TaskSynchronizer;
