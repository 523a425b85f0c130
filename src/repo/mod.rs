//!
//! # Identity Repository
//!
//! The persistence port. Handlers and the session-resolver middleware only
//! ever see the [`Repository`] trait, injected as `web::Data<dyn Repository>`,
//! so the Postgres implementation can be swapped for the in-memory one in
//! tests without touching any handler.
//!
//! Every task operation is scoped by owner id at this layer: a task id that
//! exists but belongs to someone else is reported exactly like a missing one.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::{SessionToken, Task, User};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Repository-level failure taxonomy. `Validation` carries one message per
/// violated constraint (uniqueness, referential integrity); anything else is
/// an unexpected `Storage` failure whose detail stays server-side.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoError {
    Validation(Vec<String>),
    Storage(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RepoError::Validation(msgs) => write!(f, "validation failed: {}", msgs.join("; ")),
            RepoError::Storage(detail) => write!(f, "storage failure: {}", detail),
        }
    }
}

impl std::error::Error for RepoError {}

/// A user record ready for insertion. `password_digest` is already hashed;
/// plaintext never crosses this boundary.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_digest: String,
}

/// Profile fields a user may change.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
}

/// Task fields the owner may change.
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub is_complete: bool,
}

#[async_trait]
pub trait Repository: Send + Sync {
    // Users
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    /// Updates username and email. Returns `None` when the user is gone.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError>;
    /// Deletes a user and cascades to their tokens and tasks. Idempotent.
    async fn delete_user(&self, id: i32) -> Result<(), RepoError>;

    // Tokens
    async fn create_token(&self, user_id: i32, token: String) -> Result<SessionToken, RepoError>;
    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, RepoError>;
    /// Deletes a token. Deleting an absent token is not an error.
    async fn delete_token(&self, token: &str) -> Result<(), RepoError>;
    /// Logs out all of a user's other sessions, keeping only `keep`.
    async fn delete_tokens_except(&self, user_id: i32, keep: &str) -> Result<(), RepoError>;

    // Tasks (all owner-scoped)
    async fn create_task(&self, user_id: i32, title: String) -> Result<Task, RepoError>;
    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, RepoError>;
    async fn find_task(&self, user_id: i32, task_id: i32) -> Result<Option<Task>, RepoError>;
    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, RepoError>;
    /// Returns whether a task was actually deleted.
    async fn delete_task(&self, user_id: i32, task_id: i32) -> Result<bool, RepoError>;
}
