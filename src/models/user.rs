use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    // Usernames: alphanumeric, underscores, hyphens.
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// A user as persisted. The `password` field always holds a bcrypt digest,
/// never the raw input: hashing happens exactly once, in the registration and
/// login handlers, before anything reaches the repository.
///
/// Deliberately not `Serialize` - clients only ever see [`UserView`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(
        length(min = 1, max = 50, message = "Username required"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password required"))]
    pub password: String,
}

/// Profile-edit payload. Username and email only; password rotation is not a
/// supported operation.
#[derive(Debug, Deserialize, Validate)]
pub struct UserChangesInput {
    #[validate(
        length(min = 1, max = 50, message = "Username required"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
}

/// Wire projection of a user: an explicit allow-list, so fields added to the
/// persisted record never leak by default.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
