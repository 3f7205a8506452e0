use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::authz::Principal;
use crate::error::AppError;
use crate::repo::TASK_VISIBILITY_SQL;

/// Per-status counts over the principal's visible task set.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StatusCounts {
    pub todo: i64,
    pub in_progress: i64,
    pub review: i64,
    pub done: i64,
}

impl StatusCounts {
    pub fn sum(&self) -> i64 {
        self.todo + self.in_progress + self.review + self.done
    }
}

/// Summary statistics for a principal. `total` always equals the sum of the
/// per-status counts; both come from the same grouped query.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub by_status: StatusCounts,
    /// Tasks with a due date strictly in the past that are not done.
    pub overdue: i64,
}

/// Computes counts over exactly the task set visible to the principal under
/// the read rule.
pub async fn summarize(pool: &PgPool, principal: &Principal) -> Result<TaskStats, AppError> {
    let sql = format!(
        "SELECT \
             COUNT(*) FILTER (WHERE t.status = 'todo') AS todo, \
             COUNT(*) FILTER (WHERE t.status = 'in_progress') AS in_progress, \
             COUNT(*) FILTER (WHERE t.status = 'review') AS review, \
             COUNT(*) FILTER (WHERE t.status = 'done') AS done, \
             COUNT(*) FILTER (WHERE t.due_date < NOW() AND t.status <> 'done') AS overdue \
         FROM tasks t WHERE {}",
        TASK_VISIBILITY_SQL
    );

    let (todo, in_progress, review, done, overdue): (i64, i64, i64, i64, i64) =
        sqlx::query_as(&sql)
            .bind(principal.id)
            .bind(principal.is_admin())
            .fetch_one(pool)
            .await?;

    let by_status = StatusCounts {
        todo,
        in_progress,
        review,
        done,
    };

    Ok(TaskStats {
        total: by_status.sum(),
        by_status,
        overdue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_status_counts() {
        let by_status = StatusCounts {
            todo: 3,
            in_progress: 2,
            review: 1,
            done: 4,
        };
        let stats = TaskStats {
            total: by_status.sum(),
            by_status,
            overdue: 2,
        };
        assert_eq!(stats.total, 10);
        assert_eq!(stats.total, stats.by_status.sum());
    }
}
