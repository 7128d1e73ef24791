//! Task assignment, execution, and the completion gate.

use super::{
    WorkflowServiceResult,
    dispatch::{dispatch, require_snapshot},
};
use crate::workflow::{
    domain::{ApplicationId, Caller, Role, TaskId, TestCaseId, UatTask, WorkflowCommand},
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for a worker picking up a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignTaskRequest {
    app_id: ApplicationId,
    test_case_id: TestCaseId,
}

impl AssignTaskRequest {
    /// Creates a request for the given application and test case.
    #[must_use]
    pub const fn new(app_id: ApplicationId, test_case_id: TestCaseId) -> Self {
        Self {
            app_id,
            test_case_id,
        }
    }
}

/// Worker-facing task lifecycle service.
#[derive(Clone)]
pub struct TaskExecutionService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskExecutionService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task execution service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates an `assigned` task owned by the calling worker.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when the caller is not a worker and a
    /// repository error when the task cannot be stored.
    pub async fn assign_task(
        &self,
        caller: Caller,
        request: AssignTaskRequest,
    ) -> WorkflowServiceResult<UatTask> {
        caller.require_role(Role::Worker)?;
        let task = UatTask::assign(
            request.app_id,
            request.test_case_id,
            caller.user_id(),
            &*self.clock,
        );
        self.repository.store_task(&task).await?;
        tracing::info!(
            task_id = %task.id(),
            worker_id = %task.worker_id(),
            test_case_id = %task.test_case_id(),
            "task assigned"
        );
        Ok(task)
    }

    /// Moves an assigned task into `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the caller is the assigned worker and
    /// `InvalidTransition` unless the task is `assigned`.
    pub async fn start_task(&self, caller: Caller, task_id: TaskId) -> WorkflowServiceResult<UatTask> {
        let command = WorkflowCommand::StartTask { caller };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        Ok(change_set.task().clone())
    }

    /// Submits the task for QA, first time or after a revision.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientArtifacts` when the task has neither a current
    /// bug report nor task evidence, `InvalidTransition` from any state other
    /// than `in_progress` or an in-progress revision cycle, and
    /// `Unauthorized` unless the caller is the assigned worker.
    pub async fn complete_task(
        &self,
        caller: Caller,
        task_id: TaskId,
    ) -> WorkflowServiceResult<UatTask> {
        let command = WorkflowCommand::CompleteTask { caller };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        Ok(change_set.task().clone())
    }

    /// Returns whether the completion gate would admit the task now.
    ///
    /// Read-only; the gate is re-evaluated when the task is completed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn can_complete(&self, task_id: TaskId) -> WorkflowServiceResult<bool> {
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        let admitted = snapshot.can_complete();
        tracing::debug!(task_id = %task_id, admitted, "completion gate evaluated");
        Ok(admitted)
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> WorkflowServiceResult<Option<UatTask>> {
        Ok(self.repository.find_task(task_id).await?)
    }
}
