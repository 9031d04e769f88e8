//! Display-side queries over a task list.
//!
//! Filtering and search run first, then sorting. None of this touches the
//! authoritative collection; it only borrows it.

use super::model::Task;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which tasks to show.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

/// Ordering by creation time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    #[strum(serialize = "desc", serialize = "newest_first")]
    NewestFirst,
    #[strum(serialize = "asc", serialize = "oldest_first")]
    OldestFirst,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    /// Case-insensitive substring matched against title and description.
    pub search: Option<String>,
    pub order: SortOrder,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.filter.matches(task) {
            return false;
        }
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                task.title
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(&needle))
                    || task.description.to_lowercase().contains(&needle)
            }
        }
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let mut visible: Vec<&Task> = tasks.iter().filter(|task| self.matches(task)).collect();
        match self.order {
            SortOrder::NewestFirst => visible.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::OldestFirst => visible.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tasks() -> Vec<Task> {
        let base = Utc::now();
        let make = |id: &str, title: &str, description: &str, completed: bool, age: i64| {
            let mut task = Task::provisional(title, description);
            task.id = id.to_string();
            task.completed = completed;
            task.created_at = base - Duration::minutes(age);
            task
        };
        vec![
            make("1", "Buy milk", "", false, 30),
            make("2", "Write report", "quarterly MILK numbers", true, 10),
            make("3", "Call mum", "sunday", false, 20),
        ]
    }

    fn ids(view: Vec<&Task>) -> Vec<&str> {
        view.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_default_is_newest_first() {
        let tasks = tasks();
        assert_eq!(ids(TaskQuery::new().apply(&tasks)), ["2", "3", "1"]);
    }

    #[test]
    fn test_oldest_first() {
        let tasks = tasks();
        let query = TaskQuery::new().with_order(SortOrder::OldestFirst);
        assert_eq!(ids(query.apply(&tasks)), ["1", "3", "2"]);
    }

    #[test]
    fn test_filters() {
        let tasks = tasks();
        let active = TaskQuery::new().with_filter(TaskFilter::Active);
        assert_eq!(ids(active.apply(&tasks)), ["3", "1"]);
        let done = TaskQuery::new().with_filter(TaskFilter::Completed);
        assert_eq!(ids(done.apply(&tasks)), ["2"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let tasks = tasks();
        let query = TaskQuery::new().with_search("milk");
        assert_eq!(ids(query.apply(&tasks)), ["2", "1"]);
    }

    #[test]
    fn test_filter_and_search_combine() {
        let tasks = tasks();
        let query = TaskQuery::new()
            .with_filter(TaskFilter::Active)
            .with_search("MILK");
        assert_eq!(ids(query.apply(&tasks)), ["1"]);
    }

    #[test]
    fn test_apply_does_not_mutate() {
        let tasks = tasks();
        let before = tasks.clone();
        let _ = TaskQuery::new().with_order(SortOrder::OldestFirst).apply(&tasks);
        assert_eq!(tasks, before);
    }

    #[test]
    fn test_parse_from_str() {
        assert_eq!("active".parse::<TaskFilter>().unwrap(), TaskFilter::Active);
        assert_eq!("Completed".parse::<TaskFilter>().unwrap(), TaskFilter::Completed);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::OldestFirst);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::NewestFirst);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
