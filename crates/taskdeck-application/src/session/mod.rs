//! Session management: shared session state and the manager that drives it.

mod context;
mod manager;

pub use context::SessionContext;
pub use manager::SessionManager;
