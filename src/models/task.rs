use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A task as persisted. Every task has exactly one owner; only the owner can
/// read, modify, or delete it, and the repository enforces the scoping.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload. New tasks always start incomplete.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200, message = "Title required"))]
    pub title: String,
}

/// Update payload: title and completion flag.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskChangesInput {
    #[validate(length(min = 1, max = 200, message = "Title required"))]
    pub title: String,
    pub is_complete: bool,
}

/// Wire projection of a task. The owner id stays server-side.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: i32,
    pub title: String,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            is_complete: task.is_complete,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}
