//! Service-level error type shared by all workflow services.

use crate::workflow::{
    domain::{EntityRef, ErrorKind, TaskAction, WorkflowError},
    ports::WorkflowRepositoryError,
};
use thiserror::Error;

/// Service-level errors for workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowServiceError {
    /// A workflow rule refused the operation.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Persistence failed for a reason unrelated to workflow rules.
    #[error(transparent)]
    Repository(WorkflowRepositoryError),

    /// The repository committed a change set without the expected record.
    #[error("repository returned no record for {0}")]
    MissingRecord(TaskAction),
}

/// Result type for workflow service operations.
pub type WorkflowServiceResult<T> = Result<T, WorkflowServiceError>;

impl WorkflowServiceError {
    /// Returns the workflow error classification, or `None` for
    /// infrastructure failures.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Workflow(err) => Some(err.kind()),
            Self::Repository(_) | Self::MissingRecord(_) => None,
        }
    }

    /// Returns the workflow rule violation, if this is one.
    #[must_use]
    pub const fn as_workflow(&self) -> Option<&WorkflowError> {
        match self {
            Self::Workflow(err) => Some(err),
            Self::Repository(_) | Self::MissingRecord(_) => None,
        }
    }
}

impl From<WorkflowRepositoryError> for WorkflowServiceError {
    fn from(err: WorkflowRepositoryError) -> Self {
        match err {
            WorkflowRepositoryError::TaskNotFound(id) => {
                Self::Workflow(WorkflowError::NotFound(EntityRef::Task(id)))
            }
            WorkflowRepositoryError::DuplicateBugValidation(id) => {
                Self::Workflow(WorkflowError::AlreadyValidated(EntityRef::BugReport(id)))
            }
            WorkflowRepositoryError::DuplicateTaskValidation { task_id, .. } => {
                Self::Workflow(WorkflowError::AlreadyValidated(EntityRef::Task(task_id)))
            }
            WorkflowRepositoryError::Rejected(rejection) => Self::Workflow(rejection),
            other @ (WorkflowRepositoryError::DuplicateTask(_)
            | WorkflowRepositoryError::Persistence(_)) => Self::Repository(other),
        }
    }
}
