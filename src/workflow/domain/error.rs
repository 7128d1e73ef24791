//! Error types for workflow rule violations and value parsing.

use super::{
    BugReportId, BugValidationStatus, EvidenceId, RevisionStatus, Role, TaskId, TaskStatus, UserId,
};
use std::fmt;
use thiserror::Error;

/// Reference to a workflow record, used in not-found and duplicate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// A UAT task.
    Task(TaskId),
    /// A bug report.
    BugReport(BugReportId),
    /// A test evidence item.
    Evidence(EvidenceId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::BugReport(id) => write!(f, "bug report {id}"),
            Self::Evidence(id) => write!(f, "evidence {id}"),
        }
    }
}

/// Worker or QA action attempted against a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    /// Begin executing an assigned task.
    Start,
    /// Mark the task completed (first submission or resubmission).
    Complete,
    /// File a bug report or bug revision.
    FileBugReport,
    /// Record a QA determination on a bug report.
    ValidateBug,
    /// Record a QA determination on the task.
    ApplyValidation,
    /// Begin a requested revision cycle.
    StartRevision,
    /// Attach new evidence.
    AttachEvidence,
    /// Edit or delete existing evidence.
    EditEvidence,
}

impl TaskAction {
    /// Returns a short human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start task",
            Self::Complete => "complete task",
            Self::FileBugReport => "file bug report",
            Self::ValidateBug => "validate bug report",
            Self::ApplyValidation => "validate task",
            Self::StartRevision => "start revision",
            Self::AttachEvidence => "attach evidence",
            Self::EditEvidence => "edit evidence",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a bug report cannot be revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotRevisableReason {
    /// QA has not validated the bug yet.
    Unvalidated,
    /// QA reached a final determination (`valid` or `invalid`).
    FinalDetermination(BugValidationStatus),
    /// A later revision already exists; only the chain tail may be revised.
    Superseded(BugReportId),
}

impl fmt::Display for NotRevisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unvalidated => f.write_str("bug has not been validated"),
            Self::FinalDetermination(status) => {
                write!(f, "bug was validated as {status}")
            }
            Self::Superseded(by) => write!(f, "bug was already revised by {by}"),
        }
    }
}

/// Why a caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The caller does not hold the required role.
    RoleRequired(Role),
    /// The caller is not the worker assigned to the task.
    NotAssignedWorker,
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleRequired(role) => write!(f, "role {role} required"),
            Self::NotAssignedWorker => f.write_str("caller is not the assigned worker"),
        }
    }
}

/// Workflow rule violations.
///
/// Every rejected precondition maps to exactly one variant so that callers
/// can render a precise explanation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(EntityRef),

    /// A validation already exists for the referenced record.
    #[error("{0} has already been validated")]
    AlreadyValidated(EntityRef),

    /// Some current bug reports of the task have not been validated.
    #[error("task {task_id} is not ready for validation: {unvalidated} bug report(s) unvalidated")]
    NotReady {
        /// Task under validation.
        task_id: TaskId,
        /// Number of current bug reports without a validation.
        unvalidated: usize,
    },

    /// A validation outcome requires an explanation.
    #[error("comments are required for this validation")]
    CommentsRequired,

    /// The task has neither a current bug report nor task evidence.
    #[error("task {0} has no bug reports or evidence to submit")]
    InsufficientArtifacts(TaskId),

    /// The bug report cannot be revised.
    #[error("bug report {bug_id} cannot be revised: {reason}")]
    BugNotRevisable {
        /// Bug report the caller tried to revise.
        bug_id: BugReportId,
        /// Why the revision was refused.
        reason: NotRevisableReason,
    },

    /// The action is not permitted in the task's current state.
    #[error("cannot {action} for task {task_id} in status {status} (revision {revision_status})")]
    InvalidTransition {
        /// Task the action targeted.
        task_id: TaskId,
        /// Attempted action.
        action: TaskAction,
        /// Task status when the action was attempted.
        status: TaskStatus,
        /// Revision status when the action was attempted.
        revision_status: RevisionStatus,
    },

    /// The caller may not perform the action.
    #[error("user {user_id} is not authorized: {reason}")]
    Unauthorized {
        /// Caller identity.
        user_id: UserId,
        /// Why the caller was refused.
        reason: UnauthorizedReason,
    },

    /// A required text field is empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Evidence step numbers start at one.
    #[error("invalid step number {0}, expected a positive integer")]
    InvalidStepNumber(u32),

    /// Following `original_bug_id` pointers did not terminate at a root.
    #[error("revision chain through bug report {0} is broken or cyclic")]
    CorruptRevisionChain(BugReportId),
}

/// Coarse classification of [`WorkflowError`] for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced entity absent.
    NotFound,
    /// Duplicate validation attempt.
    AlreadyValidated,
    /// Task validation attempted before all current bugs are validated.
    NotReady,
    /// Outcome requires an explanation.
    CommentsRequired,
    /// Completion without bug reports or evidence.
    InsufficientArtifacts,
    /// Attempt to revise a bug that is not awaiting more information.
    BugNotRevisable,
    /// Action not permitted in the current state.
    InvalidTransition,
    /// Caller lacks the role or ownership.
    Unauthorized,
    /// Malformed input or stored data.
    InvalidInput,
}

impl WorkflowError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyValidated(_) => ErrorKind::AlreadyValidated,
            Self::NotReady { .. } => ErrorKind::NotReady,
            Self::CommentsRequired => ErrorKind::CommentsRequired,
            Self::InsufficientArtifacts(_) => ErrorKind::InsufficientArtifacts,
            Self::BugNotRevisable { .. } => ErrorKind::BugNotRevisable,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::EmptyField(_) | Self::InvalidStepNumber(_) | Self::CorruptRevisionChain(_) => {
                ErrorKind::InvalidInput
            }
        }
    }
}

/// Error returned while parsing persisted enum values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field}: {value}")]
pub struct ParseWorkflowValueError {
    /// Name of the value being parsed.
    pub field: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseWorkflowValueError {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_owned(),
        }
    }
}
