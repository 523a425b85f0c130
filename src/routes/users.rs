use crate::{
    auth::{hash_password, CurrentUser, MaybeUser},
    config::Config,
    error::AppError,
    models::{User, UserChangesInput, UserInput, UserView},
    repo::{NewUser, Repository, UserChanges},
    routes::ok_body,
};
use actix_web::{delete, get, post, put, web, Responder};
use serde_json::json;
use validator::Validate;

/// Path value meaning "the caller's own id".
const SELF_SENTINEL: &str = "0";

fn resolve_target(raw: &str, current: Option<&User>) -> Option<i32> {
    if raw == SELF_SENTINEL {
        current.map(|u| u.id)
    } else {
        raw.parse().ok()
    }
}

/// Lists all users. Public; only the rendered projection goes out.
#[get("")]
pub async fn list_users(repo: web::Data<dyn Repository>) -> Result<impl Responder, AppError> {
    let users = repo.list_users().await?;
    let views: Vec<UserView> = users.iter().map(UserView::from).collect();
    Ok(ok_body(views))
}

/// Registers a new user.
///
/// The password is hashed exactly once, here, on the blocking thread pool;
/// the repository only ever sees the digest. Duplicate username or email
/// surfaces as a 422 validation failure.
#[post("")]
pub async fn create_user(
    repo: web::Data<dyn Repository>,
    config: web::Data<Config>,
    input: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let UserInput {
        username,
        email,
        password,
    } = input.into_inner();

    let cost = config.bcrypt_cost;
    let digest = web::block(move || hash_password(&password, cost)).await??;

    let user = repo
        .create_user(NewUser {
            username,
            email,
            password_digest: digest,
        })
        .await?;
    Ok(ok_body(UserView::from(&user)))
}

/// Fetches a user profile. Public; `0` resolves to the caller when a session
/// is attached, and to nothing otherwise.
#[get("/{user_id}")]
pub async fn get_user(
    repo: web::Data<dyn Repository>,
    path: web::Path<String>,
    MaybeUser(current): MaybeUser,
) -> Result<impl Responder, AppError> {
    let user_id = resolve_target(&path.into_inner(), current.as_ref())
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    match repo.find_user(user_id).await? {
        Some(user) => Ok(ok_body(UserView::from(&user))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Updates the caller's username and email. The target must be the caller's
/// own id or the `0` sentinel; anything else is a 403, regardless of whether
/// that other profile exists.
#[put("/{user_id}")]
pub async fn update_user(
    repo: web::Data<dyn Repository>,
    path: web::Path<String>,
    CurrentUser(user): CurrentUser,
    input: web::Json<UserChangesInput>,
) -> Result<impl Responder, AppError> {
    let raw = path.into_inner();
    if raw != SELF_SENTINEL && raw.parse::<i32>().ok() != Some(user.id) {
        return Err(AppError::Forbidden("You can only edit your own profile".into()));
    }

    input.validate()?;
    let UserChangesInput { username, email } = input.into_inner();

    match repo
        .update_user(user.id, UserChanges { username, email })
        .await?
    {
        Some(updated) => Ok(ok_body(UserView::from(&updated))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}

/// Deletes the caller's account. Tokens and tasks go with it through the
/// repository's cascade.
#[delete("/{user_id}")]
pub async fn delete_user(
    repo: web::Data<dyn Repository>,
    path: web::Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let raw = path.into_inner();
    if raw != SELF_SENTINEL && raw.parse::<i32>().ok() != Some(user.id) {
        return Err(AppError::Forbidden("You can only edit your own profile".into()));
    }

    repo.delete_user(user.id).await?;
    Ok(ok_body(json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixture_user(id: i32) -> User {
        User {
            id,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "$2b$04$digest".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_target() {
        let alice = fixture_user(7);

        assert_eq!(resolve_target("7", None), Some(7));
        assert_eq!(resolve_target("7", Some(&alice)), Some(7));
        assert_eq!(resolve_target("0", Some(&alice)), Some(7));
        assert_eq!(resolve_target("0", None), None);
        assert_eq!(resolve_target("not-a-number", Some(&alice)), None);
    }
}
