//! Revision cycle lifecycle.

use super::{WorkflowServiceResult, dispatch::dispatch};
use crate::workflow::{
    domain::{Caller, TaskId, UatTask, WorkflowCommand},
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Drives the `requested → in_progress` step of a revision cycle.
///
/// Filing revisions is handled by
/// [`BugReportService::create_bug_revision`](super::BugReportService::create_bug_revision)
/// and the cycle closes when the task is resubmitted through
/// [`TaskExecutionService::complete_task`](super::TaskExecutionService::complete_task).
#[derive(Clone)]
pub struct RevisionService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RevisionService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new revision service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Starts a requested revision cycle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless a revision was requested and not yet
    /// started (a second concurrent start fails here) and `Unauthorized`
    /// unless the caller is the assigned worker.
    pub async fn start_revision(
        &self,
        caller: Caller,
        task_id: TaskId,
    ) -> WorkflowServiceResult<UatTask> {
        let command = WorkflowCommand::StartRevision { caller };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        Ok(change_set.task().clone())
    }
}
