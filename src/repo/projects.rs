use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::authz::{Principal, ProjectAccess};
use crate::error::AppError;
use crate::models::{ActivityAction, EntityType, Project, ProjectInput};

/// Loads the ownership/membership slice of a project for policy checks.
/// Returns `None` when no such project exists.
pub async fn load_access(pool: &PgPool, project_id: Uuid) -> Result<Option<ProjectAccess>, AppError> {
    let owner: Option<(i32,)> = sqlx::query_as("SELECT owner_id FROM projects WHERE id = $1")
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    let Some((owner_id,)) = owner else {
        return Ok(None);
    };

    let members: Vec<(i32,)> =
        sqlx::query_as("SELECT user_id FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .fetch_all(pool)
            .await?;

    Ok(Some(ProjectAccess {
        id: project_id,
        owner_id,
        member_ids: members.into_iter().map(|(id,)| id).collect(),
    }))
}

/// Creates a project owned by the principal.
pub async fn create(
    pool: &PgPool,
    principal: &Principal,
    input: ProjectInput,
    activity: &ActivityLog,
) -> Result<Project, AppError> {
    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (id, name, description, owner_id, status, priority, color, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, name, description, owner_id, status, priority, color, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.description)
    .bind(principal.id)
    .bind(&input.status)
    .bind(&input.priority)
    .bind(&input.color)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    activity.record(
        principal.id,
        ActivityAction::Created,
        EntityType::Project,
        project.id.to_string(),
        project.name.clone(),
        None,
        serde_json::to_value(&project).ok(),
    );

    Ok(project)
}

/// Lists projects the principal owns or belongs to. Admins see all projects.
pub async fn list(pool: &PgPool, principal: &Principal) -> Result<Vec<Project>, AppError> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, owner_id, status, priority, color, created_at
         FROM projects p
         WHERE $2 OR p.owner_id = $1
            OR p.id IN (SELECT project_id FROM project_members WHERE user_id = $1)
         ORDER BY created_at DESC",
    )
    .bind(principal.id)
    .bind(principal.is_admin())
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

/// Fetches one project. A project that exists but is not visible to the
/// principal yields the same `NotFound` as a missing one.
pub async fn get(pool: &PgPool, principal: &Principal, project_id: Uuid) -> Result<Project, AppError> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, owner_id, status, priority, color, created_at
         FROM projects WHERE id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    if !principal.is_admin() && project.owner_id != principal.id {
        let is_member: Option<(i32,)> = sqlx::query_as(
            "SELECT user_id FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(principal.id)
        .fetch_optional(pool)
        .await?;

        if is_member.is_none() {
            return Err(AppError::NotFound("Project not found".into()));
        }
    }

    Ok(project)
}

/// Adds a member to a project. Only the project owner (or an admin) may
/// manage membership; the target user must exist. Re-adding an existing
/// member is a no-op.
pub async fn add_member(
    pool: &PgPool,
    principal: &Principal,
    project_id: Uuid,
    user_id: i32,
    activity: &ActivityLog,
) -> Result<(), AppError> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, owner_id, status, priority, color, created_at
         FROM projects WHERE id = $1",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    if !principal.is_admin() && project.owner_id != principal.id {
        return Err(AppError::Forbidden(
            "Only the project owner can add members".into(),
        ));
    }

    if !super::users::exists(pool, user_id).await? {
        return Err(AppError::ValidationError("User does not exist".into()));
    }

    sqlx::query(
        "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)
         ON CONFLICT DO NOTHING",
    )
    .bind(project_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    activity.record(
        principal.id,
        ActivityAction::Updated,
        EntityType::Project,
        project.id.to_string(),
        project.name,
        Some(format!("added member {}", user_id)),
        None,
    );

    Ok(())
}
