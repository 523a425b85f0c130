use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{SessionToken, Task, User};
use crate::repo::{NewUser, RepoError, Repository, TaskChanges, UserChanges};

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    tokens: BTreeMap<String, SessionToken>,
    tasks: BTreeMap<i32, Task>,
    next_user_id: i32,
    next_task_id: i32,
}

/// In-memory repository with the same observable semantics as the Postgres
/// implementation: unique usernames and emails, owner-scoped task lookups,
/// and user deletion cascading to tokens and tasks. Backs the integration
/// tests and local development without a database.
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Never held across an await; a poisoned lock just means a test
        // thread panicked mid-write, so keep going with the inner state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn uniqueness_violations(
    state: &State,
    username: &str,
    email: &str,
    exclude_id: Option<i32>,
) -> Vec<String> {
    let mut msgs = Vec::new();
    for user in state.users.values() {
        if Some(user.id) == exclude_id {
            continue;
        }
        if user.username == username {
            msgs.push("username must be unique".to_string());
        }
        if user.email == email {
            msgs.push("email must be unique".to_string());
        }
    }
    msgs
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut state = self.state();
        let msgs = uniqueness_violations(&state, &user.username, &user.email, None);
        if !msgs.is_empty() {
            return Err(RepoError::Validation(msgs));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_user_id,
            username: user.username,
            email: user.email,
            password: user.password_digest,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.state().users.values().cloned().collect())
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut state = self.state();
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        let msgs = uniqueness_violations(&state, &changes.username, &changes.email, Some(id));
        if !msgs.is_empty() {
            return Err(RepoError::Validation(msgs));
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| RepoError::Storage("user vanished mid-update".to_string()))?;
        user.username = changes.username;
        user.email = changes.email;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i32) -> Result<(), RepoError> {
        let mut state = self.state();
        state.users.remove(&id);
        // Cascade, mirroring the ON DELETE CASCADE foreign keys.
        state.tokens.retain(|_, t| t.user_id != id);
        state.tasks.retain(|_, t| t.user_id != id);
        Ok(())
    }

    async fn create_token(&self, user_id: i32, token: String) -> Result<SessionToken, RepoError> {
        let mut state = self.state();
        if !state.users.contains_key(&user_id) {
            return Err(RepoError::Storage(format!(
                "no user {} to attach token to",
                user_id
            )));
        }
        let created = SessionToken {
            token: token.clone(),
            user_id,
            created_at: Utc::now(),
        };
        state.tokens.insert(token, created.clone());
        Ok(created)
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let state = self.state();
        Ok(state
            .tokens
            .get(token)
            .and_then(|t| state.users.get(&t.user_id))
            .cloned())
    }

    async fn delete_token(&self, token: &str) -> Result<(), RepoError> {
        self.state().tokens.remove(token);
        Ok(())
    }

    async fn delete_tokens_except(&self, user_id: i32, keep: &str) -> Result<(), RepoError> {
        self.state()
            .tokens
            .retain(|key, t| t.user_id != user_id || key == keep);
        Ok(())
    }

    async fn create_task(&self, user_id: i32, title: String) -> Result<Task, RepoError> {
        let mut state = self.state();
        state.next_task_id += 1;
        let now = Utc::now();
        let created = Task {
            id: state.next_task_id,
            user_id,
            title,
            is_complete: false,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, RepoError> {
        let mut tasks: Vec<Task> = self
            .state()
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn find_task(&self, user_id: i32, task_id: i32) -> Result<Option<Task>, RepoError> {
        Ok(self
            .state()
            .tasks
            .get(&task_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, RepoError> {
        let mut state = self.state();
        match state.tasks.get_mut(&task_id) {
            Some(task) if task.user_id == user_id => {
                task.title = changes.title;
                task.is_complete = changes.is_complete;
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, user_id: i32, task_id: i32) -> Result<bool, RepoError> {
        let mut state = self.state();
        match state.tasks.get(&task_id) {
            Some(task) if task.user_id == user_id => {
                state.tasks.remove(&task_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_digest: "$2b$04$digest".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_create_and_find_user() {
        let repo = MemoryRepository::new();
        let created = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        assert_eq!(created.username, "alice");
        let found = repo.find_user(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        let by_name = repo.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[actix_rt::test]
    async fn test_duplicate_username_and_email_rejected() {
        let repo = MemoryRepository::new();
        repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        let err = repo
            .create_user(new_user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RepoError::Validation(vec!["username must be unique".to_string()])
        );

        let err = repo
            .create_user(new_user("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RepoError::Validation(vec!["email must be unique".to_string()])
        );
    }

    #[actix_rt::test]
    async fn test_update_user_uniqueness_excludes_self() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();
        repo.create_user(new_user("bob", "b@x.com")).await.unwrap();

        // Keeping your own username is not a collision.
        let updated = repo
            .update_user(
                alice.id,
                UserChanges {
                    username: "alice".to_string(),
                    email: "alice@x.com".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "alice@x.com");

        // Taking bob's username is.
        let err = repo
            .update_user(
                alice.id,
                UserChanges {
                    username: "bob".to_string(),
                    email: "alice@x.com".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        // And the failed update left the record unchanged.
        let current = repo.find_user(alice.id).await.unwrap().unwrap();
        assert_eq!(current.username, "alice");
        assert_eq!(current.email, "alice@x.com");
    }

    #[actix_rt::test]
    async fn test_token_resolution_until_deleted() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();

        repo.create_token(alice.id, "tok-1".to_string()).await.unwrap();
        let resolved = repo.find_user_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(resolved.id, alice.id);

        repo.delete_token("tok-1").await.unwrap();
        assert!(repo.find_user_by_token("tok-1").await.unwrap().is_none());

        // Idempotent.
        repo.delete_token("tok-1").await.unwrap();
    }

    #[actix_rt::test]
    async fn test_delete_tokens_except_keeps_current_session() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();
        let bob = repo.create_user(new_user("bob", "b@x.com")).await.unwrap();

        repo.create_token(alice.id, "alice-1".to_string()).await.unwrap();
        repo.create_token(alice.id, "alice-2".to_string()).await.unwrap();
        repo.create_token(bob.id, "bob-1".to_string()).await.unwrap();

        repo.delete_tokens_except(alice.id, "alice-1").await.unwrap();

        assert!(repo.find_user_by_token("alice-1").await.unwrap().is_some());
        assert!(repo.find_user_by_token("alice-2").await.unwrap().is_none());
        // Other users' sessions are untouched.
        assert!(repo.find_user_by_token("bob-1").await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_delete_user_cascades() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();
        repo.create_token(alice.id, "tok-1".to_string()).await.unwrap();
        let task = repo
            .create_task(alice.id, "buy milk".to_string())
            .await
            .unwrap();

        repo.delete_user(alice.id).await.unwrap();

        assert!(repo.find_user(alice.id).await.unwrap().is_none());
        assert!(repo.find_user_by_token("tok-1").await.unwrap().is_none());
        assert!(repo.find_task(alice.id, task.id).await.unwrap().is_none());
        assert!(repo.list_tasks(alice.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_task_operations_are_owner_scoped() {
        let repo = MemoryRepository::new();
        let alice = repo.create_user(new_user("alice", "a@x.com")).await.unwrap();
        let bob = repo.create_user(new_user("bob", "b@x.com")).await.unwrap();

        let task = repo
            .create_task(alice.id, "buy milk".to_string())
            .await
            .unwrap();
        assert!(!task.is_complete);

        // Bob sees nothing of alice's task, whichever operation he tries.
        assert!(repo.find_task(bob.id, task.id).await.unwrap().is_none());
        assert!(repo
            .update_task(
                bob.id,
                task.id,
                TaskChanges {
                    title: "stolen".to_string(),
                    is_complete: true,
                },
            )
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete_task(bob.id, task.id).await.unwrap());

        // The owner can complete and delete it.
        let updated = repo
            .update_task(
                alice.id,
                task.id,
                TaskChanges {
                    title: "buy milk".to_string(),
                    is_complete: true,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_complete);

        assert!(repo.delete_task(alice.id, task.id).await.unwrap());
        assert!(!repo.delete_task(alice.id, task.id).await.unwrap());
    }
}
