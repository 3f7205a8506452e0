use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

impl TaskPriority {
    /// Numeric severity rank used for ordering: urgent outranks high outranks
    /// medium outranks low.
    pub fn rank(&self) -> i16 {
        match self {
            TaskPriority::Urgent => 4,
            TaskPriority::High => 3,
            TaskPriority::Medium => 2,
            TaskPriority::Low => 1,
        }
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
///
/// Transitions are not ordered: any status may be set to any other status
/// directly. The only coupling enforced by the repository is that
/// `completed_at` is present exactly when the status is `Done`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed and under review.
    Review,
    /// Task is completed.
    Done,
}

/// Input structure for creating a task.
/// Contains validation rules for its fields; the creator is always the
/// authenticated principal, never taken from the payload.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task. Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description, at most 1000 characters.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Initial status. Defaults to `todo` when omitted.
    pub status: Option<TaskStatus>,

    /// Priority. Defaults to `medium` when omitted.
    pub priority: Option<TaskPriority>,

    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,

    /// Optional assignee. Must reference an existing user.
    pub assigned_to: Option<i32>,

    /// Optional owning project. Must reference an existing project the
    /// principal may add tasks to.
    pub project_id: Option<Uuid>,

    /// Free-form tags.
    pub tags: Option<Vec<String>>,

    pub estimated_hours: Option<f64>,
}

/// Partial update payload. Fields left out of the request body stay untouched
/// on the stored task.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    /// Identifier of the user who created the task. Immutable after creation.
    pub user_id: i32,
    /// Identifier of the user the task is assigned to, if any.
    pub assigned_to: Option<i32>,
    /// Owning project, if any.
    pub project_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Present if and only if `status` is `Done`.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single comment on a task. Comments are append-only; they are never
/// edited or removed.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Input payload for appending a comment to a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CommentInput {
    /// Comment text, required, at most 500 characters.
    #[validate(length(min = 1, max = 500))]
    pub body: String,
}

/// Input payload for (re)assigning a task. An absent or null `assigned_to`
/// un-assigns the task.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AssignInput {
    pub assigned_to: Option<i32>,
}

/// Sort keys accepted by the task list endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Represents query parameters for filtering, sorting, and paginating tasks.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<TaskStatus>,
    /// Filter tasks by priority.
    pub priority: Option<TaskPriority>,
    /// Filter tasks by owning project.
    pub project: Option<Uuid>,
    /// Filter tasks by assignee's user ID.
    pub assigned_to: Option<i32>,
    /// Search term matched case-insensitively as a substring of title or
    /// description. Pattern metacharacters in the term are escaped before the
    /// query runs.
    pub search: Option<String>,
    /// Sort key; defaults to creation date.
    pub sort_by: Option<SortKey>,
    /// Sort direction; defaults to descending.
    pub sort_order: Option<SortOrder>,
    /// 1-indexed page number; defaults to 1.
    pub page: Option<u32>,
    /// Page size; defaults to 10, capped at 100.
    pub limit: Option<u32>,
}

/// Page metadata returned alongside a task listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of tasks plus its pagination metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

impl Task {
    /// Creates a new `Task` from `TaskInput` and the creator's `user_id`.
    /// Applies the default status and priority, stamps timestamps, and sets
    /// `completed_at` when the task is created directly in `Done`.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        let now = Utc::now();
        let status = input.status.unwrap_or(TaskStatus::Todo);
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status,
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            due_date: input.due_date,
            user_id,
            assigned_to: input.assigned_to,
            project_id: input.project_id,
            tags: input.tags.unwrap_or_default(),
            estimated_hours: input.estimated_hours,
            actual_hours: None,
            completed_at: if status == TaskStatus::Done {
                Some(now)
            } else {
                None
            },
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assigned_to: None,
            project_id: None,
            tags: None,
            estimated_hours: None,
        }
    }

    #[test]
    fn test_task_creation_defaults() {
        let task = Task::new(input("Test Task"), 1);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.user_id, 1);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.assigned_to.is_none());
        assert!(task.completed_at.is_none());
        assert!(task.tags.is_empty());
    }

    #[test]
    fn test_task_created_done_gets_completed_at() {
        let mut done_input = input("Done already");
        done_input.status = Some(TaskStatus::Done);
        let task = Task::new(done_input, 1);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_task_input_validation() {
        assert!(input("Valid Task").validate().is_ok());

        assert!(
            input("").validate().is_err(),
            "Validation should fail for empty title."
        );

        assert!(
            input(&"a".repeat(201)).validate().is_err(),
            "Validation should fail for overly long title."
        );

        let mut long_desc = input("Valid title");
        long_desc.description = Some("b".repeat(1001));
        assert!(
            long_desc.validate().is_err(),
            "Validation should fail for overly long description."
        );
    }

    #[test]
    fn test_comment_input_validation() {
        let valid = CommentInput {
            body: "Looks good".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty = CommentInput {
            body: "".to_string(),
        };
        assert!(empty.validate().is_err());

        let too_long = CommentInput {
            body: "c".repeat(501),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_priority_rank_ordering() {
        assert!(TaskPriority::Urgent.rank() > TaskPriority::High.rank());
        assert!(TaskPriority::High.rank() > TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() > TaskPriority::Low.rank());
    }

    #[test]
    fn test_sort_key_deserialization() {
        let key: SortKey = serde_json::from_str("\"due_date\"").unwrap();
        assert_eq!(key, SortKey::DueDate);
        let order: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(order, SortOrder::Asc);
    }
}
