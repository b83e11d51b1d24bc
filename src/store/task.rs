//! Task records and the shapes used to create, search and patch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known tables of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Tasks,
}

impl Table {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTask {
    /// Fresh, uncompleted task stamped with `now`
    pub fn new(title: impl Into<String>, description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn with_id(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Sparse update applied by [`crate::store::Store::update`].
///
/// Only non-empty values are merged: an empty string leaves the stored field
/// untouched, so a field can never be cleared through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Patch that marks a task as completed at `at`
    pub fn complete(at: DateTime<Utc>) -> Self {
        Self {
            completed_at: Some(at),
            ..Self::default()
        }
    }

    /// Merge into `task`, returning whether any field changed.
    /// `updated_at` is refreshed to `now` when something did.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(title) = non_empty(self.title.as_deref()) {
            changed |= task.title != title;
            task.title = title.to_string();
        }
        if let Some(description) = non_empty(self.description.as_deref()) {
            changed |= task.description != description;
            task.description = description.to_string();
        }
        if let Some(completed_at) = self.completed_at {
            changed |= task.completed_at != Some(completed_at);
            task.completed_at = Some(completed_at);
        }

        if changed {
            task.updated_at = now;
        }
        changed
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Case-insensitive substring search over task fields.
///
/// A task matches when *any* provided field value is contained in the
/// corresponding task field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSearch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TaskSearch {
    /// Search for `text` in either the title or the description
    pub fn text(text: &str) -> Self {
        Self {
            title: Some(text.to_string()),
            description: Some(text.to_string()),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        contains_ignore_case(&task.title, self.title.as_deref())
            || contains_ignore_case(&task.description, self.description.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_some_and(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}
