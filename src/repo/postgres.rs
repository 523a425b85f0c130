use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{SessionToken, Task, User};
use crate::repo::{NewUser, RepoError, Repository, TaskChanges, UserChanges};

const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";
const TASK_COLUMNS: &str = "id, user_id, title, is_complete, created_at, updated_at";

/// Postgres-backed repository. Uniqueness lives in the schema's UNIQUE
/// constraints (surfaced as validation failures here), and user deletion
/// cascades to tokens and tasks through ON DELETE CASCADE foreign keys
/// rather than application-orchestrated deletes.
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(error: sqlx::Error) -> RepoError {
        if let sqlx::Error::Database(db_err) = &error {
            // 23505: unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let message = db_err.message();
                let field = if message.contains("username") {
                    "username"
                } else if message.contains("email") {
                    "email"
                } else {
                    "value"
                };
                return RepoError::Validation(vec![format!("{} must be unique", field)]);
            }
        }
        RepoError::Storage(error.to_string())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let sql = format!(
            "INSERT INTO users (username, email, password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_digest)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let sql = format!(
            "UPDATE users SET username = $1, email = $2, updated_at = now() \
             WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        );
        let updated = sqlx::query_as::<_, User>(&sql)
            .bind(&changes.username)
            .bind(&changes.email)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_user(&self, id: i32) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_token(&self, user_id: i32, token: String) -> Result<SessionToken, RepoError> {
        let created = sqlx::query_as::<_, SessionToken>(
            "INSERT INTO tokens (token, user_id) VALUES ($1, $2) \
             RETURNING token, user_id, created_at",
        )
        .bind(&token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.password, u.created_at, u.updated_at \
             FROM users u JOIN tokens t ON t.user_id = u.id WHERE t.token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_token(&self, token: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_tokens_except(&self, user_id: i32, keep: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND token <> $2")
            .bind(user_id)
            .bind(keep)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_task(&self, user_id: i32, title: String) -> Result<Task, RepoError> {
        let sql = format!(
            "INSERT INTO tasks (user_id, title) VALUES ($1, $2) RETURNING {}",
            TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(&title)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, RepoError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn find_task(&self, user_id: i32, task_id: i32) -> Result<Option<Task>, RepoError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, RepoError> {
        let sql = format!(
            "UPDATE tasks SET title = $1, is_complete = $2, updated_at = now() \
             WHERE id = $3 AND user_id = $4 RETURNING {}",
            TASK_COLUMNS
        );
        let updated = sqlx::query_as::<_, Task>(&sql)
            .bind(&changes.title)
            .bind(changes.is_complete)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_task(&self, user_id: i32, task_id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
