pub mod health;
pub mod session;
pub mod tasks;
pub mod users;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;

/// Renders the success envelope shared by every endpoint.
pub(crate) fn ok_body(response: impl Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true, "response": response }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(users::list_users)
            .service(users::create_user)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/session")
            .service(session::login)
            .service(session::logout_others)
            .service(session::logout),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
