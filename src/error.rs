//!
//! # Error Handling
//!
//! This module defines the application-wide error type `AppError` and its mapping
//! onto HTTP responses. Every response body, success or failure, uses the same
//! envelope: `{ "ok": true, "response": ... }` or `{ "ok": false, "error": ... }`.
//!
//! The mapping is uniform across all handlers:
//! - `Validation` -> 422 with one message per violated field constraint
//! - `Unauthenticated` -> 401 (identity required, none resolved)
//! - `Forbidden` -> 403 (authenticated but not authorized for the target)
//! - `NotFound` -> 404 (absent, or owned by someone else - indistinguishable)
//! - `Internal` -> 500 with a fixed generic message; the detail is logged
//!   server-side and never sent to the client.

use actix_web::{error::ResponseError, web, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::repo::RepoError;

#[derive(Debug)]
pub enum AppError {
    /// The request needs a resolved identity and none was attached (HTTP 401).
    Unauthenticated,
    /// The caller is authenticated but may not act on the target resource (HTTP 403).
    Forbidden(String),
    /// The resource does not exist for this caller (HTTP 404).
    NotFound(String),
    /// Client input violated one or more field constraints (HTTP 422).
    Validation(Vec<String>),
    /// Unexpected server-side failure (HTTP 500). The message is for logs only.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Unauthenticated"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Validation(msgs) => write!(f, "Validation Failed: {}", msgs.join("; ")),
            AppError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthenticated => HttpResponse::Unauthorized().json(json!({
                "ok": false,
                "error": { "msg": "Authorization required" }
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "ok": false,
                "error": { "msg": msg }
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "ok": false,
                "error": { "msg": msg }
            })),
            AppError::Validation(msgs) => HttpResponse::UnprocessableEntity().json(json!({
                "ok": false,
                "error": { "msgs": msgs }
            })),
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                HttpResponse::InternalServerError().json(json!({
                    "ok": false,
                    "error": { "msg": "Something unexpected happened" }
                }))
            }
        }
    }
}

/// Flattens `validator` output into one message per violated constraint.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut msgs: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => format!("{}: {}", field, m),
                None => format!("{}: invalid {}", field, e.code),
            })
        })
        .collect();
    msgs.sort();
    msgs
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(validation_messages(&errors))
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> AppError {
        match error {
            RepoError::Validation(msgs) => AppError::Validation(msgs),
            RepoError::Storage(detail) => AppError::Internal(detail),
        }
    }
}

/// A cancelled blocking task (e.g. a bcrypt call) is an unexpected failure.
impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

/// JSON body problems (malformed JSON, missing required fields) share the 422
/// validation outcome, so "missing field" and "invalid field" are one taxonomy
/// entry. Register this on the `App` alongside the other app data.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into())
}
