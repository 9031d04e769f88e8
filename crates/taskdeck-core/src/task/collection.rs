//! Ordered, id-keyed task collection.

use super::model::Task;
use super::view::TaskQuery;

/// The ordered set of tasks mirrored from the server.
///
/// Order is insertion order: new tasks go to the front, restored tasks are
/// appended. Ids are unique; inserting an id that is already present replaces
/// the existing entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Inserts `task` at the front.
    pub fn insert_front(&mut self, task: Task) {
        if let Some(existing) = self.get_mut(&task.id) {
            *existing = task;
            return;
        }
        self.tasks.insert(0, task);
    }

    /// Appends `task` at the back.
    pub fn push(&mut self, task: Task) {
        if let Some(existing) = self.get_mut(&task.id) {
            *existing = task;
            return;
        }
        self.tasks.push(task);
    }

    /// Replaces the entry with id `id` by `task`, keeping its position.
    ///
    /// `task` may carry a different id (provisional → server id). If another
    /// entry already holds the new id, that duplicate is dropped.
    ///
    /// Returns false if no entry with `id` exists.
    pub fn replace(&mut self, id: &str, task: Task) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if task.id != id {
            if let Some(duplicate) = self.position(&task.id) {
                self.tasks.remove(duplicate);
                let index = if duplicate < index { index - 1 } else { index };
                self.tasks[index] = task;
                return true;
            }
        }
        self.tasks[index] = task;
        true
    }

    /// Removes and returns the entry with id `id`.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let index = self.position(id)?;
        Some(self.tasks.remove(index))
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    /// Filtered, searched and sorted view. Never mutates the collection.
    pub fn view(&self, query: &TaskQuery) -> Vec<&Task> {
        query.apply(&self.tasks)
    }
}

impl From<Vec<Task>> for TaskCollection {
    fn from(tasks: Vec<Task>) -> Self {
        let mut collection = Self::new();
        for task in tasks {
            collection.push(task);
        }
        collection
    }
}
