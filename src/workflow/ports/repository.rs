//! Repository port for UAT task, bug, validation, and evidence persistence.

use crate::workflow::domain::{
    BugReport, BugReportId, EvidenceId, TaskChangeSet, TaskId, TaskSnapshot, TestEvidence, UatTask,
    WorkflowCommand, WorkflowError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow repository operations.
pub type WorkflowRepositoryResult<T> = Result<T, WorkflowRepositoryError>;

/// Workflow persistence contract.
///
/// Reads return point-in-time copies. Every mutation after task creation
/// goes through [`WorkflowRepository::execute`], which loads the task
/// snapshot, plans the command, and commits the resulting change set as one
/// atomic unit with respect to every other `execute` on the same task.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores a newly assigned task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store_task(&self, task: &UatTask) -> WorkflowRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_task(&self, id: TaskId) -> WorkflowRepositoryResult<Option<UatTask>>;

    /// Loads a task together with every record it owns, read consistently.
    ///
    /// Returns `None` when the task does not exist.
    async fn load_snapshot(&self, id: TaskId) -> WorkflowRepositoryResult<Option<TaskSnapshot>>;

    /// Finds a bug report by identifier.
    async fn find_bug_report(&self, id: BugReportId)
    -> WorkflowRepositoryResult<Option<BugReport>>;

    /// Finds an evidence item by identifier.
    async fn find_evidence(&self, id: EvidenceId) -> WorkflowRepositoryResult<Option<TestEvidence>>;

    /// Plans `command` against the current snapshot of `task_id` and commits
    /// the result.
    ///
    /// Implementations must hold exclusive access to the task for the whole
    /// load-plan-commit sequence.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::TaskNotFound`] when the task does
    /// not exist, [`WorkflowRepositoryError::Rejected`] when planning fails,
    /// and a duplicate variant when a uniqueness constraint fires at commit.
    async fn execute(
        &self,
        task_id: TaskId,
        command: WorkflowCommand,
        issued_at: DateTime<Utc>,
    ) -> WorkflowRepositoryResult<TaskChangeSet>;
}

/// Errors returned by workflow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The bug report already has a validation.
    #[error("duplicate validation for bug report: {0}")]
    DuplicateBugValidation(BugReportId),

    /// The task already has a validation for the revision cycle.
    #[error("duplicate validation for task {task_id} in revision cycle {revision_cycle}")]
    DuplicateTaskValidation {
        /// Validated task.
        task_id: TaskId,
        /// Revision cycle already decided.
        revision_cycle: u32,
    },

    /// The command was refused by the workflow rules.
    #[error(transparent)]
    Rejected(#[from] WorkflowError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
