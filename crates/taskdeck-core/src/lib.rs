//! Domain layer for taskdeck.
//!
//! Holds the task and session models, the contracts the application layer
//! depends on (request gateway, credential store) and the pure view queries
//! layered over a task collection.

pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod task;
pub mod timestamp;
pub mod user;

// Re-export common error type
pub use error::{Result, TaskdeckError};
