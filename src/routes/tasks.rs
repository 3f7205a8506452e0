use crate::{
    activity::ActivityLog,
    auth::AuthenticatedUserId,
    error::AppError,
    models::{AssignInput, CommentInput, TaskInput, TaskQuery, TaskUpdate},
    notifier::ChangeNotifier,
    repo,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Retrieves one page of the tasks visible to the authenticated user.
///
/// Visibility covers tasks the user created, is assigned to, or can read
/// through project ownership/membership; admins see everything. Supports
/// filtering by `status`, `priority`, `project`, `assigned_to`, and a
/// `search` term matched case-insensitively against title and description
/// (pattern metacharacters in the term are escaped, so it is always a
/// literal substring match).
///
/// ## Query Parameters:
/// - `status`, `priority`, `project`, `assigned_to`, `search` (all optional filters)
/// - `sort_by` (optional): one of `created_at`, `due_date`, `priority`, `title`.
/// - `sort_order` (optional): `asc` or `desc` (default `desc`).
/// - `page` (optional): 1-indexed page number, default 1.
/// - `limit` (optional): page size, default 10, max 100.
///
/// ## Responses:
/// - `200 OK`: `{ "tasks": [...], "pagination": {...} }`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let page = repo::tasks::list(&pool, &principal, &query_params).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Creates a new task with the authenticated user as creator.
///
/// Status defaults to `todo` and priority to `medium`. A referenced assignee
/// or project must exist, and the user must be an owner or member of the
/// target project.
///
/// ## Responses:
/// - `201 Created`: `{ "data": Task }`.
/// - `400 Bad Request`: Validation failure or unknown referenced entity.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    activity: web::Data<ActivityLog>,
    task_data: web::Json<TaskInput>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    // Validate input before any mutation logic runs
    task_data.validate()?;

    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let task = repo::tasks::create(
        &pool,
        &principal,
        task_data.into_inner(),
        &notifier,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({ "data": task })))
}

/// Retrieves a specific task by its ID, including its comments.
///
/// A task that does not exist and a task the user may not read both yield
/// `404 Not Found`.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let (task, comments) = repo::tasks::get(&pool, &principal, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": task, "comments": comments })))
}

/// Partially updates a task.
///
/// Only fields present in the body are changed. A status write into `done`
/// stamps the completion timestamp; a write out of `done` clears it.
///
/// ## Responses:
/// - `200 OK`: `{ "data": Task }`.
/// - `403 Forbidden`: Task is readable but the user may not update it.
/// - `404 Not Found`: Task absent or not visible to the user.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    activity: web::Data<ActivityLog>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let task = repo::tasks::update(
        &pool,
        &principal,
        task_id.into_inner(),
        task_data.into_inner(),
        &notifier,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": task })))
}

/// Deletes a task. Only the creator (or an admin) may delete.
///
/// ## Responses:
/// - `200 OK`: `{ "message": ... }`.
/// - `403 Forbidden` / `404 Not Found`: as for update.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    activity: web::Data<ActivityLog>,
    task_id: web::Path<Uuid>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    repo::tasks::delete(
        &pool,
        &principal,
        task_id.into_inner(),
        &notifier,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted" })))
}

/// Appends a comment to a task. Creator, assignee, or admin only.
#[post("/{id}/comments")]
pub async fn add_comment(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    activity: web::Data<ActivityLog>,
    task_id: web::Path<Uuid>,
    comment_data: web::Json<CommentInput>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;

    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let comment = repo::tasks::add_comment(
        &pool,
        &principal,
        task_id.into_inner(),
        comment_data.into_inner().body,
        &notifier,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Sets or clears the assignee of a task. Creator or admin only; a null or
/// absent `assigned_to` un-assigns.
#[put("/{id}/assign")]
pub async fn assign_task(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    activity: web::Data<ActivityLog>,
    task_id: web::Path<Uuid>,
    assign_data: web::Json<AssignInput>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let task = repo::tasks::assign(
        &pool,
        &principal,
        task_id.into_inner(),
        assign_data.assigned_to,
        &notifier,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": task })))
}

/// Summary statistics over the user's visible task set: total, per-status
/// counts, and the number of overdue tasks (due in the past and not done).
#[get("/stats/summary")]
pub async fn stats_summary(
    pool: web::Data<PgPool>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let stats = repo::stats::summarize(&pool, &principal).await?;
    Ok(HttpResponse::Ok().json(json!({ "stats": stats })))
}
