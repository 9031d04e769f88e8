//! Task domain module.
//!
//! This module contains task-related domain models, the collection the
//! synchronizer owns and the view queries layered on top of it.

pub mod collection;
pub mod model;
pub mod view;

pub use collection::TaskCollection;
pub use model::{
    NewTask, PROVISIONAL_ID_PREFIX, Task, TaskPatch, TaskUpdate, is_provisional_id,
};
pub use view::{SortOrder, TaskFilter, TaskQuery};
