use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{TaskChangesInput, TaskInput, TaskView},
    repo::{Repository, TaskChanges},
    routes::ok_body,
};
use actix_web::{delete, get, post, put, web, Responder};
use serde_json::json;
use validator::Validate;

/// Lists the caller's tasks, newest first. Tasks belonging to anyone else are
/// invisible here by construction: every repository call is scoped by the
/// caller's id.
#[get("")]
pub async fn list_tasks(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = repo.list_tasks(user.id).await?;
    let views: Vec<TaskView> = tasks.iter().map(TaskView::from).collect();
    Ok(ok_body(views))
}

/// Creates a task for the caller. New tasks always start incomplete.
#[post("")]
pub async fn create_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    input: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let task = repo.create_task(user.id, input.into_inner().title).await?;
    Ok(ok_body(TaskView::from(&task)))
}

/// Fetches one of the caller's tasks. A task owned by someone else gets the
/// same 404 as a task that does not exist, so nothing about other tenants'
/// data leaks through status codes.
#[get("/{task_id}")]
pub async fn get_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    match repo.find_task(user.id, task_id.into_inner()).await? {
        Some(task) => Ok(ok_body(TaskView::from(&task))),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates a task's title and completion flag; owner only, same 404 rule as
/// `get_task`.
#[put("/{task_id}")]
pub async fn update_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i32>,
    input: web::Json<TaskChangesInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;
    let TaskChangesInput { title, is_complete } = input.into_inner();

    match repo
        .update_task(user.id, task_id.into_inner(), TaskChanges { title, is_complete })
        .await?
    {
        Some(task) => Ok(ok_body(TaskView::from(&task))),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes one of the caller's tasks; owner only, same 404 rule as `get_task`.
#[delete("/{task_id}")]
pub async fn delete_task(
    repo: web::Data<dyn Repository>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    if !repo.delete_task(user.id, task_id.into_inner()).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    Ok(ok_body(json!({})))
}
