use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The action recorded by an audit entry.
/// Corresponds to the `activity_action` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Assigned,
    Completed,
    Commented,
}

/// The entity class an audit entry refers to.
/// Corresponds to the `entity_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "entity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Task,
    Project,
    User,
}

/// One audit-trail record. Rows are append-only; nothing in the application
/// ever mutates or deletes them.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    /// The principal that performed the action.
    pub user_id: i32,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    /// Entity identifier, stored as text so one column covers both integer
    /// user ids and UUID task/project ids.
    pub entity_id: String,
    /// Name of the entity at the time of the action.
    pub entity_name: String,
    pub detail: Option<String>,
    /// Raw change payload, for clients that want to render diffs.
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
