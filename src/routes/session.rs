use crate::{
    auth::{generate_token, verify_password, CurrentUser, LoginRequest, SESSION_COOKIE},
    error::AppError,
    models::TokenView,
    repo::Repository,
    routes::ok_body,
};
use actix_web::cookie::{time::Duration, Cookie};
use actix_web::{delete, post, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

const SESSION_DAYS: i64 = 30;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(Duration::days(SESSION_DAYS))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Logs a user in: verifies the credentials, mints a fresh opaque token, and
/// sets it as an httpOnly cookie. The token view is also in the body so
/// non-browser clients can store it themselves.
///
/// Password verification runs against an empty digest when the username is
/// unknown, so both failure modes do comparable work and return the same 403.
#[post("")]
pub async fn login(
    repo: web::Data<dyn Repository>,
    input: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let LoginRequest { username, password } = input.into_inner();

    let user = repo.find_user_by_username(&username).await?;
    let digest = user.as_ref().map(|u| u.password.clone()).unwrap_or_default();
    let matched = web::block(move || verify_password(&password, &digest)).await?;

    let user = match user {
        Some(user) if matched => user,
        _ => return Err(AppError::Forbidden("Wrong username or password".into())),
    };

    let session = repo.create_token(user.id, generate_token()).await?;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(session.token.clone()))
        .json(json!({ "ok": true, "response": TokenView::from(&session) })))
}

/// Logs the current session out and clears the cookie. Idempotent: no cookie,
/// or a token already gone, is still a 200.
#[delete("")]
pub async fn logout(
    repo: web::Data<dyn Repository>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        repo.delete_token(cookie.value()).await?;
    }
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(json!({ "ok": true, "response": {} })))
}

/// Logs out all of the caller's other sessions, keeping the current one.
#[delete("/others")]
pub async fn logout_others(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        repo.delete_tokens_except(user.id, cookie.value()).await?;
    }
    Ok(ok_body(json!({})))
}
