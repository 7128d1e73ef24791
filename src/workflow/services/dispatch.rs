//! Shared command dispatch and lookups used by the workflow services.

use super::{WorkflowServiceError, WorkflowServiceResult};
use crate::workflow::{
    domain::{
        BugReport, BugReportId, EntityRef, EvidenceOwner, TaskChangeSet, TaskId, TaskSnapshot,
        WorkflowCommand, WorkflowError,
    },
    ports::WorkflowRepository,
};
use chrono::{DateTime, Utc};

/// Runs `command` through the repository's atomic `execute` and logs the
/// outcome.
pub(super) async fn dispatch<R>(
    repository: &R,
    task_id: TaskId,
    command: WorkflowCommand,
    issued_at: DateTime<Utc>,
) -> WorkflowServiceResult<TaskChangeSet>
where
    R: WorkflowRepository + ?Sized,
{
    let action = command.action();
    let actor = command.caller().user_id();
    let role = command.caller().role();

    match repository.execute(task_id, command, issued_at).await {
        Ok(change_set) => {
            let task = change_set.task();
            tracing::info!(
                task_id = %task_id,
                action = %action,
                actor = %actor,
                role = %role,
                status = %task.status(),
                revision_status = %task.revision_status(),
                "workflow command committed"
            );
            Ok(change_set)
        }
        Err(err) => {
            let service_error = WorkflowServiceError::from(err);
            tracing::warn!(
                task_id = %task_id,
                action = %action,
                actor = %actor,
                kind = ?service_error.kind(),
                error = %service_error,
                "workflow command rejected"
            );
            Err(service_error)
        }
    }
}

/// Loads a task snapshot or fails with `NotFound`.
pub(super) async fn require_snapshot<R>(
    repository: &R,
    task_id: TaskId,
) -> WorkflowServiceResult<TaskSnapshot>
where
    R: WorkflowRepository + ?Sized,
{
    repository
        .load_snapshot(task_id)
        .await?
        .ok_or(WorkflowServiceError::Workflow(WorkflowError::NotFound(
            EntityRef::Task(task_id),
        )))
}

/// Loads a bug report or fails with `NotFound`.
pub(super) async fn require_bug_report<R>(
    repository: &R,
    bug_id: BugReportId,
) -> WorkflowServiceResult<BugReport>
where
    R: WorkflowRepository + ?Sized,
{
    repository
        .find_bug_report(bug_id)
        .await?
        .ok_or(WorkflowServiceError::Workflow(WorkflowError::NotFound(
            EntityRef::BugReport(bug_id),
        )))
}

/// Resolves the task that owns evidence attached to `owner`.
pub(super) async fn owning_task<R>(
    repository: &R,
    owner: EvidenceOwner,
) -> WorkflowServiceResult<TaskId>
where
    R: WorkflowRepository + ?Sized,
{
    match owner {
        EvidenceOwner::Task(task_id) => Ok(task_id),
        EvidenceOwner::BugReport(bug_id) => {
            Ok(require_bug_report(repository, bug_id).await?.task_id())
        }
    }
}
