pub mod activity;
pub mod project;
pub mod task;
pub mod user;

pub use activity::{Activity, ActivityAction, EntityType};
pub use project::{Project, ProjectInput, ProjectMemberInput};
pub use task::{
    AssignInput, Comment, CommentInput, Pagination, SortKey, SortOrder, Task, TaskInput,
    TaskPage, TaskPriority, TaskQuery, TaskStatus, TaskUpdate,
};
pub use user::{User, UserRole};
