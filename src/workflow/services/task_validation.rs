//! QA determinations on whole tasks.

use super::{
    WorkflowServiceError, WorkflowServiceResult,
    dispatch::{dispatch, require_snapshot},
};
use crate::workflow::{
    domain::{
        Caller, TaskAction, TaskId, TaskValidation, TaskValidationOutcome, UatTask,
        WorkflowCommand,
    },
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for validating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskValidationRequest {
    task_id: TaskId,
    outcome: TaskValidationOutcome,
    comments: String,
}

impl TaskValidationRequest {
    /// Creates a request without comments.
    #[must_use]
    pub const fn new(task_id: TaskId, outcome: TaskValidationOutcome) -> Self {
        Self {
            task_id,
            outcome,
            comments: String::new(),
        }
    }

    /// Sets the QA explanation; required for `need_revision`.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }
}

/// Outcome of a task validation: the task after the transition and the
/// audit record written with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTaskValidation {
    /// Task after the transition.
    pub task: UatTask,
    /// Audit record of the decision.
    pub validation: TaskValidation,
}

/// Task validation and outcome service.
#[derive(Clone)]
pub struct TaskValidationService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskValidationService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task validation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Applies a QA decision to a completed task.
    ///
    /// Readiness is re-evaluated inside the same critical section as the
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the caller is a QA specialist,
    /// `InvalidTransition` unless the task is `completed`,
    /// `CommentsRequired` for a revision request without comments, and
    /// `NotReady` while any current bug report is unvalidated.
    pub async fn apply_task_validation(
        &self,
        caller: Caller,
        request: TaskValidationRequest,
    ) -> WorkflowServiceResult<AppliedTaskValidation> {
        let TaskValidationRequest {
            task_id,
            outcome,
            comments,
        } = request;
        let command = WorkflowCommand::ApplyTaskValidation {
            caller,
            outcome,
            comments,
        };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        let validation = change_set
            .task_validation()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::ApplyValidation))?;
        Ok(AppliedTaskValidation {
            task: change_set.task().clone(),
            validation,
        })
    }

    /// Lists the decisions recorded for a task, oldest cycle first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn list_task_validations(
        &self,
        task_id: TaskId,
    ) -> WorkflowServiceResult<Vec<TaskValidation>> {
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        Ok(snapshot.task_validations().to_vec())
    }
}
