//! Task domain model.
//!
//! A task is identified either by a provisional id (generated locally while
//! the create request is in flight) or by the id the server assigned to it.
//! The two forms are told apart by [`PROVISIONAL_ID_PREFIX`].

use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Reserved prefix of locally generated task ids.
pub const PROVISIONAL_ID_PREFIX: &str = "temp-";

/// Returns true if `id` is a provisional (not yet acknowledged) task id.
pub fn is_provisional_id(id: &str) -> bool {
    id.starts_with(PROVISIONAL_ID_PREFIX)
}

/// A single to-do item.
///
/// Field names follow the client's vocabulary; the serde renames map them to
/// the server's wire names (`is_completed`, `user_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(rename = "is_completed", default)]
    pub completed: bool,
    #[serde(rename = "user_id", default, deserialize_with = "null_as_empty")]
    pub owner_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds the local placeholder shown while a create request is pending.
    ///
    /// The owner is unknown until the server answers and is left empty.
    pub fn provisional(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", PROVISIONAL_ID_PREFIX, Uuid::new_v4()),
            title: Some(title.into()),
            description: description.into(),
            completed: false,
            owner_id: String::new(),
            created_at: now,
            updated_at: Some(now),
        }
    }

    pub fn is_provisional(&self) -> bool {
        is_provisional_id(&self.id)
    }

    /// Returns a copy of this task with `patch` applied.
    ///
    /// A field left unset in the patch keeps this task's current value.
    pub fn merged(&self, patch: &TaskPatch) -> Self {
        let mut merged = self.clone();
        if let Some(title) = &patch.title {
            merged.title = Some(title.clone());
        }
        if let Some(description) = &patch.description {
            merged.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            merged.completed = completed;
        }
        merged
    }

    /// Title for display; untitled tasks fall back to their description.
    pub fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.description,
        }
    }
}

/// A partial edit of a task. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "is_completed", default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Body of `POST /tasks/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

/// Body of `PUT /tasks/{id}/`: the full merged representation of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    pub description: &'a str,
    pub is_completed: bool,
}

impl<'a> From<&'a Task> for TaskUpdate<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            title: task.title.as_deref(),
            description: &task.description,
            is_completed: task.completed,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
