use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A project groups tasks and carries its own membership list. Tasks reference
/// projects weakly: deleting a project does not cascade to its tasks.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// The user who owns the project. Owners can always read project tasks
    /// and manage membership.
    pub owner_id: i32,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Display color tag for clients.
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input payload for creating a project. The owner is always the
/// authenticated principal.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<String>,
    pub priority: Option<String>,
    pub color: Option<String>,
}

/// Input payload for adding a member to a project.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectMemberInput {
    pub user_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_input_validation() {
        let valid = ProjectInput {
            name: "Platform".to_string(),
            description: Some("Infra work".to_string()),
            status: None,
            priority: None,
            color: Some("#ff0000".to_string()),
        };
        assert!(valid.validate().is_ok());

        let empty_name = ProjectInput {
            name: "".to_string(),
            description: None,
            status: None,
            priority: None,
            color: None,
        };
        assert!(empty_name.validate().is_err());
    }
}
