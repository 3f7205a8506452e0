//!
//! # Authorization Policy
//!
//! Pure permission checks for task operations. Nothing in this module touches
//! the database or produces side effects; callers load the task and (when the
//! task belongs to one) its project, then ask whether the principal may
//! perform an operation.
//!
//! The model is an explicit allow-list. Rules are evaluated in precedence
//! order and anything that matches no rule is denied:
//!
//! 1. Admins may do everything.
//! 2. Task without a project: creator or assignee may read/update/comment;
//!    only the creator may delete/assign.
//! 3. Task with a project: read additionally extends to the project owner and
//!    listed members; update/comment still require creator-or-assignee;
//!    delete/assign still require the creator.

use crate::models::{Task, UserRole};
use uuid::Uuid;

/// The authenticated identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// An operation a principal may attempt against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
    Comment,
    Assign,
}

/// The slice of a project the policy needs: its owner and member list.
#[derive(Debug, Clone)]
pub struct ProjectAccess {
    pub id: Uuid,
    pub owner_id: i32,
    pub member_ids: Vec<i32>,
}

impl ProjectAccess {
    fn includes(&self, user_id: i32) -> bool {
        self.owner_id == user_id || self.member_ids.contains(&user_id)
    }
}

/// Decides whether `principal` may perform `op` on `task`.
///
/// `project` must be the task's owning project when it has one; passing
/// `None` for a project-owned task simply evaluates the stricter rule 2,
/// which never grants more than rule 3 would.
pub fn can_perform(
    principal: &Principal,
    op: Operation,
    task: &Task,
    project: Option<&ProjectAccess>,
) -> bool {
    if principal.is_admin() {
        return true;
    }

    let is_creator = task.user_id == principal.id;
    let is_assignee = task.assigned_to == Some(principal.id);

    match op {
        Operation::Read => {
            is_creator
                || is_assignee
                || project.map_or(false, |p| p.includes(principal.id))
        }
        Operation::Update | Operation::Comment => is_creator || is_assignee,
        Operation::Delete | Operation::Assign => is_creator,
    }
}
