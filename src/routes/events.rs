use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    notifier::{ChangeNotifier, Scope},
    repo,
};
use actix_web::{get, web, HttpResponse, Responder};
use futures::StreamExt;
use serde::Deserialize;
use sqlx::PgPool;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// Subscribe to a project's scope. The user must be able to read the project.
    pub project: Option<Uuid>,
    /// Subscribe to a user scope. Restricted to the user themselves (or admins).
    pub user: Option<i32>,
}

/// Server-sent-events stream of change notifications for one scope.
///
/// The client holds the connection open and receives one SSE frame per
/// published event (`event:` carries the kind, `data:` the entity payload).
/// Dropping the connection drops the subscription; events published while
/// disconnected are permanently missed (best-effort delivery, no replay).
#[get("/events")]
pub async fn events(
    pool: web::Data<PgPool>,
    notifier: web::Data<ChangeNotifier>,
    query: web::Query<EventQuery>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let principal = repo::users::resolve_principal(&pool, user_id.0).await?;

    let scope = match (query.project, query.user) {
        (Some(project_id), _) => {
            // Joining a project room requires read access to the project;
            // a project the user cannot see behaves as missing.
            repo::projects::get(&pool, &principal, project_id).await?;
            Scope::Project(project_id)
        }
        (None, Some(target_user)) => {
            if target_user != principal.id && !principal.is_admin() {
                return Err(AppError::Forbidden(
                    "Cannot subscribe to another user's events".into(),
                ));
            }
            Scope::User(target_user)
        }
        (None, None) => Scope::User(principal.id),
    };

    let (_subscription_id, rx) = notifier.subscribe(scope);
    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event.payload).unwrap_or_else(|_| "{}".to_string());
        Ok::<_, actix_web::Error>(web::Bytes::from(format!(
            "event: {}\ndata: {}\n\n",
            event.kind.as_str(),
            data
        )))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .append_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}
