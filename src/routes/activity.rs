use crate::{activity::ActivityLog, auth::AuthenticatedUserId, error::AppError, repo};
use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Maximum entries to return, default 50, capped at 200.
    pub limit: Option<i64>,
}

/// Recent audit-trail entries for the authenticated user's own actions.
/// Admins see entries from all users.
#[get("/activity")]
pub async fn recent_activity(
    pool: web::Data<PgPool>,
    activity: web::Data<ActivityLog>,
    query: web::Query<ActivityQuery>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;
    let activities = activity.recent(&principal, query.limit.unwrap_or(50)).await?;
    Ok(HttpResponse::Ok().json(json!({ "activities": activities })))
}
