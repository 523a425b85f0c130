use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A session token as persisted. Many tokens may exist per user (one per
/// concurrent session); each resolves to exactly one user until deleted.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SessionToken {
    pub token: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Wire projection of a session token, returned on login.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub token: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&SessionToken> for TokenView {
    fn from(token: &SessionToken) -> Self {
        Self {
            token: token.token.clone(),
            user_id: token.user_id,
            created_at: token.created_at,
        }
    }
}
