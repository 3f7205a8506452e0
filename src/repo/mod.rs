pub mod projects;
pub mod stats;
pub mod tasks;
pub mod users;

/// SQL fragment restricting a task row set to what the principal may read.
/// `$1` binds the principal id, `$2` binds the admin flag. Mirrors the read
/// rule of the authorization policy: creator, assignee, or owner/member of
/// the owning project; admins see everything.
pub(crate) const TASK_VISIBILITY_SQL: &str = "($2 OR t.user_id = $1 OR t.assigned_to = $1 \
     OR t.project_id IN (SELECT id FROM projects WHERE owner_id = $1 \
                         UNION SELECT project_id FROM project_members WHERE user_id = $1))";
