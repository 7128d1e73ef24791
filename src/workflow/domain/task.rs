//! UAT task aggregate root and its status machines.

use super::{
    ApplicationId, ArtifactSummary, ParseWorkflowValueError, ReadinessReport, TaskAction, TaskId,
    TaskValidationOutcome, TestCaseId, UserId, WorkflowError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a UAT task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The worker picked the test case but has not started.
    Assigned,
    /// The worker is executing the test case.
    InProgress,
    /// The worker submitted the task for QA.
    Completed,
    /// QA asked for rework of flagged bugs.
    RevisionRequired,
    /// QA accepted the task.
    Verified,
    /// QA rejected the task.
    Rejected,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::RevisionRequired => "revision_required",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    /// Returns `true` when the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Assigned, Self::InProgress)
                | (Self::InProgress | Self::RevisionRequired, Self::Completed)
                | (
                    Self::Completed,
                    Self::Verified | Self::Rejected | Self::RevisionRequired
                )
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "revision_required" => Ok(Self::RevisionRequired),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseWorkflowValueError::new("task status", value)),
        }
    }
}

/// Status of the most recent revision cycle.
///
/// `Completed` is kept as a historical marker after the cycle ends; it is
/// never reset to `None`. [`TaskStatus`] is the authoritative openness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    /// No revision has ever been requested.
    None,
    /// QA requested a revision; the worker has not started it.
    Requested,
    /// The worker is reworking flagged bugs.
    InProgress,
    /// The worker resubmitted the task.
    Completed,
}

impl RevisionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Requested => "requested",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` while a revision cycle is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Requested | Self::InProgress)
    }
}

impl fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RevisionStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "requested" => Ok(Self::Requested),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseWorkflowValueError::new("revision status", value)),
        }
    }
}

/// UAT task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UatTask {
    id: TaskId,
    app_id: ApplicationId,
    test_case_id: TestCaseId,
    worker_id: UserId,
    status: TaskStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    revision_count: u32,
    revision_status: RevisionStatus,
    revision_comments: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Application under test.
    pub app_id: ApplicationId,
    /// Test case being executed.
    pub test_case_id: TestCaseId,
    /// Assigned worker.
    pub worker_id: UserId,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// When the worker started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task last reached `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of revisions requested so far.
    pub revision_count: u32,
    /// Revision cycle status.
    pub revision_status: RevisionStatus,
    /// QA explanation for the latest revision request.
    pub revision_comments: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UatTask {
    /// Creates a task for a worker who picked a test case.
    #[must_use]
    pub fn assign(
        app_id: ApplicationId,
        test_case_id: TestCaseId,
        worker_id: UserId,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            app_id,
            test_case_id,
            worker_id,
            status: TaskStatus::Assigned,
            started_at: None,
            completed_at: None,
            revision_count: 0,
            revision_status: RevisionStatus::None,
            revision_comments: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            app_id: data.app_id,
            test_case_id: data.test_case_id,
            worker_id: data.worker_id,
            status: data.status,
            started_at: data.started_at,
            completed_at: data.completed_at,
            revision_count: data.revision_count,
            revision_status: data.revision_status,
            revision_comments: data.revision_comments,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the application under test.
    #[must_use]
    pub const fn app_id(&self) -> ApplicationId {
        self.app_id
    }

    /// Returns the executed test case.
    #[must_use]
    pub const fn test_case_id(&self) -> TestCaseId {
        self.test_case_id
    }

    /// Returns the assigned worker.
    #[must_use]
    pub const fn worker_id(&self) -> UserId {
        self.worker_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns when the worker started, if they have.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task last reached `completed`.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns how many revisions QA has requested.
    #[must_use]
    pub const fn revision_count(&self) -> u32 {
        self.revision_count
    }

    /// Returns the revision cycle status.
    #[must_use]
    pub const fn revision_status(&self) -> RevisionStatus {
        self.revision_status
    }

    /// Returns the QA explanation for the latest revision request.
    #[must_use]
    pub fn revision_comments(&self) -> Option<&str> {
        self.revision_comments.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` while the worker may file bugs and attach evidence.
    #[must_use]
    pub const fn is_accepting_artifacts(&self) -> bool {
        matches!(self.status, TaskStatus::InProgress)
            || matches!(
                (self.status, self.revision_status),
                (TaskStatus::RevisionRequired, RevisionStatus::InProgress)
            )
    }

    /// Returns `true` while existing evidence may be edited or deleted.
    #[must_use]
    pub const fn is_evidence_editable(&self) -> bool {
        matches!(self.status, TaskStatus::InProgress)
    }

    /// Builds the error for an action refused in the current state.
    #[must_use]
    pub const fn invalid_transition(&self, action: TaskAction) -> WorkflowError {
        WorkflowError::InvalidTransition {
            task_id: self.id,
            action,
            status: self.status,
            revision_status: self.revision_status,
        }
    }

    /// Ensures new artifacts may be recorded for `action`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] outside an active task or
    /// active revision cycle.
    pub const fn ensure_accepting_artifacts(&self, action: TaskAction) -> Result<(), WorkflowError> {
        if self.is_accepting_artifacts() {
            return Ok(());
        }
        Err(self.invalid_transition(action))
    }

    /// Starts executing the task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the task is
    /// `assigned`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.transition(TaskStatus::InProgress, TaskAction::Start, at)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Submits the task for QA.
    ///
    /// First submissions come from `in_progress`; resubmissions come from
    /// `revision_required` with a revision cycle in progress, which closes
    /// the cycle.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] from any other state and
    /// [`WorkflowError::InsufficientArtifacts`] when the task has neither a
    /// current bug report nor task evidence.
    pub fn complete(
        &mut self,
        artifacts: ArtifactSummary,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let resubmission = match (self.status, self.revision_status) {
            (TaskStatus::InProgress, _) => false,
            (TaskStatus::RevisionRequired, RevisionStatus::InProgress) => true,
            _ => return Err(self.invalid_transition(TaskAction::Complete)),
        };
        if !artifacts.permits_completion() {
            return Err(WorkflowError::InsufficientArtifacts(self.id));
        }

        self.transition(TaskStatus::Completed, TaskAction::Complete, at)?;
        self.completed_at = Some(at);
        if resubmission {
            self.revision_status = RevisionStatus::Completed;
        }
        Ok(())
    }

    /// Applies a QA decision to a completed task.
    ///
    /// `readiness` must be computed from the same snapshot the decision is
    /// committed against.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless the task is
    /// `completed`, [`WorkflowError::CommentsRequired`] when a revision is
    /// requested without comments, and [`WorkflowError::NotReady`] while any
    /// current bug report is unvalidated.
    pub fn apply_validation(
        &mut self,
        outcome: TaskValidationOutcome,
        comments: &str,
        readiness: &ReadinessReport,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if self.status != TaskStatus::Completed {
            return Err(self.invalid_transition(TaskAction::ApplyValidation));
        }
        let trimmed = comments.trim();
        if outcome.requires_comments() && trimmed.is_empty() {
            return Err(WorkflowError::CommentsRequired);
        }
        if !readiness.is_ready() {
            return Err(WorkflowError::NotReady {
                task_id: self.id,
                unvalidated: readiness.unvalidated_bug_reports(),
            });
        }

        let target = outcome.resulting_status();
        self.transition(target, TaskAction::ApplyValidation, at)?;
        if outcome == TaskValidationOutcome::NeedRevision {
            self.revision_status = RevisionStatus::Requested;
            self.revision_comments = Some(trimmed.to_owned());
            self.revision_count = self.revision_count.saturating_add(1);
        }
        Ok(())
    }

    /// Begins a requested revision cycle.
    ///
    /// Only the revision status changes; the task stays in
    /// `revision_required` until resubmitted.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidTransition`] unless a revision has been
    /// requested and not yet started.
    pub fn start_revision(&mut self, at: DateTime<Utc>) -> Result<(), WorkflowError> {
        if self.status != TaskStatus::RevisionRequired
            || self.revision_status != RevisionStatus::Requested
        {
            return Err(self.invalid_transition(TaskAction::StartRevision));
        }
        self.revision_status = RevisionStatus::InProgress;
        self.updated_at = at;
        Ok(())
    }

    fn transition(
        &mut self,
        target: TaskStatus,
        action: TaskAction,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(action));
        }
        self.status = target;
        self.updated_at = at;
        Ok(())
    }
}
