use db::models::{
    module::{Module, ModuleStatus},
    task::Task,
};
use sqlx::PgPool;
use sqlx::error::Error as SqlxError;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error(transparent)]
    Sqlx(#[from] SqlxError),
    #[error("Module not found")]
    ModuleNotFound,
}

/// Derive a module's progress percentage and lifecycle status from its task
/// counts.
///
/// `review` is never produced here; it is an administrative state set only
/// through the module update endpoint.
pub fn derive(total: i64, completed: i64) -> (i32, ModuleStatus) {
    if total == 0 {
        return (0, ModuleStatus::Pending);
    }
    let progress = ((completed as f64 / total as f64) * 100.0).round() as i32;
    let status = if completed == 0 {
        ModuleStatus::Pending
    } else if completed == total {
        ModuleStatus::Complete
    } else {
        ModuleStatus::InProgress
    };
    (progress, status)
}

/// Recompute a module's `progress`/`status` from the authoritative task set
/// and write both back. Runs after every task mutation.
///
/// The read-recompute-write sequence executes in one transaction with the
/// module row locked, so two concurrent task mutations against the same
/// module serialize instead of persisting a stale intermediate result.
/// Idempotent: with no intervening task mutation, a second run writes the
/// same values.
pub async fn recompute(pool: &PgPool, module_id: Uuid) -> Result<Module, ProgressError> {
    let mut tx = pool.begin().await?;

    let module = Module::find_by_id_for_update(&mut *tx, module_id)
        .await?
        .ok_or(ProgressError::ModuleNotFound)?;

    let (total, completed) = Task::completion_counts(&mut *tx, module_id).await?;
    let (progress, status) = derive(total, completed);

    let updated = Module::set_progress(&mut *tx, module.id, progress, status).await?;
    tx.commit().await?;

    debug!(
        "Recomputed module {}: {}/{} tasks complete -> {}% ({})",
        module_id, completed, total, progress, status
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_is_pending_at_zero() {
        assert_eq!(derive(0, 0), (0, ModuleStatus::Pending));
    }

    #[test]
    fn no_completed_tasks_is_pending() {
        assert_eq!(derive(10, 0), (0, ModuleStatus::Pending));
    }

    #[test]
    fn partial_completion_is_in_progress() {
        assert_eq!(derive(10, 3), (30, ModuleStatus::InProgress));
    }

    #[test]
    fn all_tasks_complete_is_complete() {
        assert_eq!(derive(5, 5), (100, ModuleStatus::Complete));
    }

    #[test]
    fn removing_the_last_incomplete_task_completes_the_module() {
        // 4 of 5 complete, then the open task is deleted.
        assert_eq!(derive(5, 4), (80, ModuleStatus::InProgress));
        assert_eq!(derive(4, 4), (100, ModuleStatus::Complete));
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        assert_eq!(derive(3, 1).0, 33);
        assert_eq!(derive(3, 2).0, 67);
        assert_eq!(derive(8, 1).0, 13); // 12.5 rounds up
    }

    #[test]
    fn status_tracks_counts_not_rounded_percentage() {
        // 1 of 1000 rounds to 0% but the module is still in progress.
        let (progress, status) = derive(1000, 1);
        assert_eq!(progress, 0);
        assert_eq!(status, ModuleStatus::InProgress);

        // 999 of 1000 rounds to 100% but must not read as complete.
        let (progress, status) = derive(1000, 999);
        assert_eq!(progress, 100);
        assert_eq!(status, ModuleStatus::InProgress);
    }

    #[test]
    fn derivation_is_idempotent() {
        let first = derive(7, 4);
        let second = derive(7, 4);
        assert_eq!(first, second);
    }
}
