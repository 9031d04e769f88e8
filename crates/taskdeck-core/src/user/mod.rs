//! User identity domain.

pub mod model;

pub use model::{Identity, IdentityPatch};
