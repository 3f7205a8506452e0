use crate::{
    activity::ActivityLog,
    auth::AuthenticatedUserId,
    error::AppError,
    models::{ProjectInput, ProjectMemberInput},
    repo,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Creates a project owned by the authenticated user.
#[post("")]
pub async fn create_project(
    pool: web::Data<PgPool>,
    activity: web::Data<ActivityLog>,
    project_data: web::Json<ProjectInput>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;

    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let project =
        repo::projects::create(&pool, &principal, project_data.into_inner(), &activity).await?;

    Ok(HttpResponse::Created().json(json!({ "data": project })))
}

/// Lists projects the user owns or belongs to (all projects for admins).
#[get("")]
pub async fn list_projects(
    pool: web::Data<PgPool>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let projects = repo::projects::list(&pool, &principal).await?;
    Ok(HttpResponse::Ok().json(json!({ "projects": projects })))
}

/// Fetches one project visible to the user.
#[get("/{id}")]
pub async fn get_project(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let project = repo::projects::get(&pool, &principal, project_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": project })))
}

/// Adds a member to a project. Project owner or admin only.
#[post("/{id}/members")]
pub async fn add_member(
    pool: web::Data<PgPool>,
    activity: web::Data<ActivityLog>,
    project_id: web::Path<Uuid>,
    member_data: web::Json<ProjectMemberInput>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    repo::projects::add_member(
        &pool,
        &principal,
        project_id.into_inner(),
        member_data.user_id,
        &activity,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Member added" })))
}
