//!
//! # Task Repository
//!
//! All task reads and writes go through this module. Queries are scoped to
//! what the principal may read, mutations are gated by the authorization
//! policy, and every successful mutation invokes the post-commit hooks: the
//! change notifier publish and the activity record. Both hooks run after the
//! row is committed, so subscribers never observe a notification for an
//! uncommitted write; neither hook can fail the mutation.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::authz::{can_perform, Operation, Principal, ProjectAccess};
use crate::error::AppError;
use crate::models::{
    ActivityAction, Comment, EntityType, Pagination, SortKey, SortOrder, Task, TaskInput,
    TaskPage, TaskQuery, TaskStatus, TaskUpdate,
};
use crate::notifier::{ChangeEvent, ChangeNotifier, EventKind, Scope};
use crate::repo::TASK_VISIBILITY_SQL;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.priority, t.due_date, \
     t.user_id, t.assigned_to, t.project_id, t.tags, t.estimated_hours, t.actual_hours, \
     t.completed_at, t.created_at, t.updated_at";

/// Escapes ILIKE pattern metacharacters in a user-supplied search term so the
/// term is matched as a literal substring. Without this a term like `%` or
/// `_` would be interpreted as a wildcard pattern.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Builds page metadata for a listing of `total` visible rows.
fn page_meta(total: i64, page: u32, limit: u32) -> Pagination {
    let total_pages = if total == 0 {
        0
    } else {
        (total + limit as i64 - 1) / limit as i64
    };
    Pagination {
        total,
        page,
        limit,
        total_pages,
        has_next: (page as i64) < total_pages,
        has_prev: page > 1 && total > 0,
    }
}

fn order_clause(sort_by: Option<SortKey>, sort_order: Option<SortOrder>) -> String {
    let expr = match sort_by.unwrap_or(SortKey::CreatedAt) {
        SortKey::CreatedAt => "t.created_at",
        SortKey::DueDate => "t.due_date",
        SortKey::Title => "lower(t.title)",
        // Severity rank: urgent > high > medium > low
        SortKey::Priority => {
            "CASE t.priority WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END"
        }
    };
    let dir = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    // Ties broken by creation date, newest first
    format!("ORDER BY {} {}, t.created_at DESC", expr, dir)
}

/// The notifier scope owning a task: its project when it has one, otherwise
/// its creator.
fn scope_for(task: &Task) -> Scope {
    match task.project_id {
        Some(project_id) => Scope::Project(project_id),
        None => Scope::User(task.user_id),
    }
}

async fn fetch_task(pool: &PgPool, id: Uuid) -> Result<Option<Task>, AppError> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks t WHERE t.id = $1",
        TASK_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

async fn access_for(pool: &PgPool, task: &Task) -> Result<Option<ProjectAccess>, AppError> {
    match task.project_id {
        Some(project_id) => super::projects::load_access(pool, project_id).await,
        None => Ok(None),
    }
}

/// Loads a task and enforces authorization for `op`.
///
/// A task that does not exist and a task the principal may not read are both
/// reported as `NotFound`, so unauthorized callers cannot probe for
/// existence. A readable task the principal may not mutate yields
/// `Forbidden`.
async fn load_authorized(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    op: Operation,
) -> Result<Task, AppError> {
    let task = fetch_task(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    let access = access_for(pool, &task).await?;

    if !can_perform(principal, Operation::Read, &task, access.as_ref()) {
        return Err(AppError::NotFound("Task not found".into()));
    }
    if op != Operation::Read && !can_perform(principal, op, &task, access.as_ref()) {
        return Err(AppError::Forbidden(
            "Not authorized to perform this operation".into(),
        ));
    }
    Ok(task)
}

/// Returns one page of the tasks visible to the principal, after applying the
/// optional filters, sort, and pagination from `query`.
pub async fn list(
    pool: &PgPool,
    principal: &Principal,
    query: &TaskQuery,
) -> Result<TaskPage, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    // $1 = principal id, $2 = admin flag; filter params start at $3.
    let mut conditions: Vec<String> = vec![TASK_VISIBILITY_SQL.to_string()];
    let mut param = 3;

    if query.status.is_some() {
        conditions.push(format!("t.status = ${}", param));
        param += 1;
    }
    if query.priority.is_some() {
        conditions.push(format!("t.priority = ${}", param));
        param += 1;
    }
    if query.project.is_some() {
        conditions.push(format!("t.project_id = ${}", param));
        param += 1;
    }
    if query.assigned_to.is_some() {
        conditions.push(format!("t.assigned_to = ${}", param));
        param += 1;
    }
    if query.search.is_some() {
        conditions.push(format!(
            "(t.title ILIKE ${} OR t.description ILIKE ${})",
            param,
            param + 1
        ));
        param += 2;
    }

    let where_sql = format!("WHERE {}", conditions.join(" AND "));
    let search_pattern = query
        .search
        .as_ref()
        .map(|term| format!("%{}%", escape_like(term)));

    // Count first, then fetch the requested page with identical bindings.
    let count_sql = format!("SELECT COUNT(*) FROM tasks t {}", where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(principal.id)
        .bind(principal.is_admin());
    if let Some(status) = query.status {
        count_query = count_query.bind(status);
    }
    if let Some(priority) = query.priority {
        count_query = count_query.bind(priority);
    }
    if let Some(project) = query.project {
        count_query = count_query.bind(project);
    }
    if let Some(assigned_to) = query.assigned_to {
        count_query = count_query.bind(assigned_to);
    }
    if let Some(pattern) = &search_pattern {
        count_query = count_query.bind(pattern.clone()).bind(pattern.clone());
    }
    let total = count_query.fetch_one(pool).await?;

    let select_sql = format!(
        "SELECT {} FROM tasks t {} {} LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        where_sql,
        order_clause(query.sort_by, query.sort_order),
        param,
        param + 1
    );
    let mut select_query = sqlx::query_as::<_, Task>(&select_sql)
        .bind(principal.id)
        .bind(principal.is_admin());
    if let Some(status) = query.status {
        select_query = select_query.bind(status);
    }
    if let Some(priority) = query.priority {
        select_query = select_query.bind(priority);
    }
    if let Some(project) = query.project {
        select_query = select_query.bind(project);
    }
    if let Some(assigned_to) = query.assigned_to {
        select_query = select_query.bind(assigned_to);
    }
    if let Some(pattern) = &search_pattern {
        select_query = select_query.bind(pattern.clone()).bind(pattern.clone());
    }
    let tasks = select_query
        .bind(limit as i64)
        .bind(((page - 1) as i64) * limit as i64)
        .fetch_all(pool)
        .await?;

    Ok(TaskPage {
        tasks,
        pagination: page_meta(total, page, limit),
    })
}

/// Creates a task with the principal as its creator. Referenced entities are
/// checked up front: an unknown assignee or project, or a project the
/// principal may not add tasks to, rejects the input before any write.
pub async fn create(
    pool: &PgPool,
    principal: &Principal,
    input: TaskInput,
    notifier: &ChangeNotifier,
    activity: &ActivityLog,
) -> Result<Task, AppError> {
    if let Some(assignee) = input.assigned_to {
        if !super::users::exists(pool, assignee).await? {
            return Err(AppError::ValidationError("Assignee does not exist".into()));
        }
    }
    if let Some(project_id) = input.project_id {
        let access = super::projects::load_access(pool, project_id)
            .await?
            .ok_or_else(|| AppError::ValidationError("Project does not exist".into()))?;
        let is_member =
            access.owner_id == principal.id || access.member_ids.contains(&principal.id);
        if !principal.is_admin() && !is_member {
            return Err(AppError::ValidationError(
                "Not a member of the target project".into(),
            ));
        }
    }

    let task = Task::new(input, principal.id);
    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, status, priority, due_date, user_id, \
         assigned_to, project_id, tags, estimated_hours, actual_hours, completed_at, \
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.user_id)
    .bind(task.assigned_to)
    .bind(task.project_id)
    .bind(&task.tags)
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.completed_at)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(pool)
    .await?;

    notifier.publish(
        scope_for(&task),
        ChangeEvent {
            kind: EventKind::TaskCreated,
            payload: serde_json::to_value(&task).unwrap_or_default(),
        },
    );
    activity.record(
        principal.id,
        ActivityAction::Created,
        EntityType::Task,
        task.id.to_string(),
        task.title.clone(),
        None,
        serde_json::to_value(&task).ok(),
    );

    Ok(task)
}

/// Fetches one task visible to the principal, with its comments.
pub async fn get(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
) -> Result<(Task, Vec<Comment>), AppError> {
    let task = load_authorized(pool, principal, id, Operation::Read).await?;
    let comments = sqlx::query_as::<_, Comment>(
        "SELECT id, task_id, author_id, body, created_at
         FROM task_comments WHERE task_id = $1 ORDER BY created_at ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok((task, comments))
}

/// Applies a partial update. Fields absent from `changes` are untouched.
///
/// The completion timestamp is coupled to status on every write: a
/// transition into `done` stamps it (idempotently: an already-done task keeps
/// its original timestamp), a transition out of `done` clears it.
pub async fn update(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    changes: TaskUpdate,
    notifier: &ChangeNotifier,
    activity: &ActivityLog,
) -> Result<Task, AppError> {
    let mut task = load_authorized(pool, principal, id, Operation::Update).await?;
    let old_status = task.status;
    let now = Utc::now();

    if let Some(title) = changes.title {
        task.title = title;
    }
    if let Some(description) = changes.description {
        task.description = Some(description);
    }
    if let Some(status) = changes.status {
        task.status = status;
    }
    if let Some(priority) = changes.priority {
        task.priority = priority;
    }
    if let Some(due_date) = changes.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(tags) = changes.tags {
        task.tags = tags;
    }
    if let Some(estimated_hours) = changes.estimated_hours {
        task.estimated_hours = Some(estimated_hours);
    }
    if let Some(actual_hours) = changes.actual_hours {
        task.actual_hours = Some(actual_hours);
    }

    // completed_at is present iff status is done
    if task.status == TaskStatus::Done {
        if task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
    } else {
        task.completed_at = None;
    }
    task.updated_at = now;

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks t SET title = $2, description = $3, status = $4, priority = $5, \
         due_date = $6, tags = $7, estimated_hours = $8, actual_hours = $9, \
         completed_at = $10, updated_at = $11
         WHERE t.id = $1
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(&task.tags)
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.completed_at)
    .bind(task.updated_at)
    .fetch_one(pool)
    .await?;

    notifier.publish(
        scope_for(&task),
        ChangeEvent {
            kind: EventKind::TaskUpdated,
            payload: serde_json::to_value(&task).unwrap_or_default(),
        },
    );
    let action = if task.status == TaskStatus::Done && old_status != TaskStatus::Done {
        ActivityAction::Completed
    } else {
        ActivityAction::Updated
    };
    activity.record(
        principal.id,
        action,
        EntityType::Task,
        task.id.to_string(),
        task.title.clone(),
        None,
        serde_json::to_value(&task).ok(),
    );

    Ok(task)
}

/// Deletes a task. Requires delete-level authorization (creator or admin).
pub async fn delete(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    notifier: &ChangeNotifier,
    activity: &ActivityLog,
) -> Result<(), AppError> {
    let task = load_authorized(pool, principal, id, Operation::Delete).await?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    notifier.publish(
        scope_for(&task),
        ChangeEvent {
            kind: EventKind::TaskDeleted,
            payload: serde_json::json!({ "id": task.id, "project_id": task.project_id }),
        },
    );
    activity.record(
        principal.id,
        ActivityAction::Deleted,
        EntityType::Task,
        task.id.to_string(),
        task.title,
        None,
        None,
    );

    Ok(())
}

/// Appends a comment. Comments get a server-assigned timestamp and the
/// principal as author; they can never be edited or removed.
pub async fn add_comment(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    body: String,
    notifier: &ChangeNotifier,
    activity: &ActivityLog,
) -> Result<Comment, AppError> {
    let task = load_authorized(pool, principal, id, Operation::Comment).await?;

    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO task_comments (id, task_id, author_id, body, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, task_id, author_id, body, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(task.id)
    .bind(principal.id)
    .bind(&body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    notifier.publish(
        scope_for(&task),
        ChangeEvent {
            kind: EventKind::CommentAdded,
            payload: serde_json::to_value(&comment).unwrap_or_default(),
        },
    );
    activity.record(
        principal.id,
        ActivityAction::Commented,
        EntityType::Task,
        task.id.to_string(),
        task.title,
        Some(body),
        None,
    );

    Ok(comment)
}

/// Sets or clears the assignee. Requires assign-level authorization (creator
/// or admin); a `None` assignee un-assigns.
pub async fn assign(
    pool: &PgPool,
    principal: &Principal,
    id: Uuid,
    assignee: Option<i32>,
    notifier: &ChangeNotifier,
    activity: &ActivityLog,
) -> Result<Task, AppError> {
    load_authorized(pool, principal, id, Operation::Assign).await?;

    if let Some(assignee_id) = assignee {
        if !super::users::exists(pool, assignee_id).await? {
            return Err(AppError::ValidationError("Assignee does not exist".into()));
        }
    }

    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks t SET assigned_to = $2, updated_at = $3 WHERE t.id = $1 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(id)
    .bind(assignee)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    notifier.publish(
        scope_for(&task),
        ChangeEvent {
            kind: EventKind::TaskAssigned,
            payload: serde_json::to_value(&task).unwrap_or_default(),
        },
    );
    activity.record(
        principal.id,
        ActivityAction::Assigned,
        EntityType::Task,
        task.id.to_string(),
        task.title.clone(),
        assignee.map(|a| format!("assigned to {}", a)),
        None,
    );

    Ok(task)
}
