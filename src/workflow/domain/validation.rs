//! QA determinations on bug reports and tasks.

use super::{
    BugReportId, BugValidationId, ParseWorkflowValueError, TaskId, TaskStatus, TaskValidationId,
    UserId, WorkflowError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// QA determination on a single bug report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugValidationStatus {
    /// The defect is genuine.
    Valid,
    /// The defect is not reproducible or not a defect.
    Invalid,
    /// QA cannot decide without more information from the worker.
    NeedsMoreInfo,
}

impl BugValidationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::NeedsMoreInfo => "needs_more_info",
        }
    }

    /// Returns `true` when the worker may file a revision of the bug.
    #[must_use]
    pub const fn permits_revision(self) -> bool {
        matches!(self, Self::NeedsMoreInfo)
    }
}

impl fmt::Display for BugValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BugValidationStatus {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            "needs_more_info" => Ok(Self::NeedsMoreInfo),
            _ => Err(ParseWorkflowValueError::new("bug validation status", value)),
        }
    }
}

/// Record of a QA determination on one bug report.
///
/// At most one exists per bug report and it is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugValidation {
    id: BugValidationId,
    bug_report_id: BugReportId,
    qa_id: UserId,
    status: BugValidationStatus,
    comments: String,
    validated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted bug validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBugValidationData {
    /// Persisted identifier.
    pub id: BugValidationId,
    /// Validated bug report.
    pub bug_report_id: BugReportId,
    /// Deciding QA specialist.
    pub qa_id: UserId,
    /// Determination.
    pub status: BugValidationStatus,
    /// QA explanation.
    pub comments: String,
    /// Decision timestamp.
    pub validated_at: DateTime<Utc>,
}

impl BugValidation {
    /// Records a determination.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::CommentsRequired`] when `comments` is blank.
    pub fn record(
        bug_report_id: BugReportId,
        qa_id: UserId,
        status: BugValidationStatus,
        comments: &str,
        at: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        let trimmed = comments.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::CommentsRequired);
        }
        Ok(Self {
            id: BugValidationId::new(),
            bug_report_id,
            qa_id,
            status,
            comments: trimmed.to_owned(),
            validated_at: at,
        })
    }

    /// Reconstructs a validation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBugValidationData) -> Self {
        Self {
            id: data.id,
            bug_report_id: data.bug_report_id,
            qa_id: data.qa_id,
            status: data.status,
            comments: data.comments,
            validated_at: data.validated_at,
        }
    }

    /// Returns the validation identifier.
    #[must_use]
    pub const fn id(&self) -> BugValidationId {
        self.id
    }

    /// Returns the validated bug report.
    #[must_use]
    pub const fn bug_report_id(&self) -> BugReportId {
        self.bug_report_id
    }

    /// Returns the deciding QA specialist.
    #[must_use]
    pub const fn qa_id(&self) -> UserId {
        self.qa_id
    }

    /// Returns the determination.
    #[must_use]
    pub const fn status(&self) -> BugValidationStatus {
        self.status
    }

    /// Returns the QA explanation.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Returns the decision timestamp.
    #[must_use]
    pub const fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }
}

/// QA determination on a whole task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskValidationOutcome {
    /// Accept the task. Terminal.
    PassVerified,
    /// Reject the task. Terminal and irreversible.
    Rejected,
    /// Reopen the task for a revision cycle.
    NeedRevision,
}

impl TaskValidationOutcome {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PassVerified => "pass_verified",
            Self::Rejected => "rejected",
            Self::NeedRevision => "need_revision",
        }
    }

    /// Returns `true` when QA must explain the outcome.
    #[must_use]
    pub const fn requires_comments(self) -> bool {
        matches!(self, Self::NeedRevision)
    }

    /// Returns the task status the outcome moves a completed task into.
    #[must_use]
    pub const fn resulting_status(self) -> TaskStatus {
        match self {
            Self::PassVerified => TaskStatus::Verified,
            Self::Rejected => TaskStatus::Rejected,
            Self::NeedRevision => TaskStatus::RevisionRequired,
        }
    }
}

impl fmt::Display for TaskValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskValidationOutcome {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass_verified" => Ok(Self::PassVerified),
            "rejected" => Ok(Self::Rejected),
            "need_revision" => Ok(Self::NeedRevision),
            _ => Err(ParseWorkflowValueError::new("task validation outcome", value)),
        }
    }
}

/// Audit record of a QA decision on a task.
///
/// One record exists per revision cycle; `revision_cycle` is the task's
/// `revision_count` at the moment the decision was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskValidation {
    id: TaskValidationId,
    task_id: TaskId,
    qa_id: UserId,
    outcome: TaskValidationOutcome,
    comments: String,
    revision_cycle: u32,
    validated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskValidationData {
    /// Persisted identifier.
    pub id: TaskValidationId,
    /// Validated task.
    pub task_id: TaskId,
    /// Deciding QA specialist.
    pub qa_id: UserId,
    /// Outcome.
    pub outcome: TaskValidationOutcome,
    /// QA explanation, possibly empty.
    pub comments: String,
    /// Revision cycle the decision belongs to.
    pub revision_cycle: u32,
    /// Decision timestamp.
    pub validated_at: DateTime<Utc>,
}

impl TaskValidation {
    /// Records a decision for the given cycle.
    #[must_use]
    pub fn record(
        task_id: TaskId,
        qa_id: UserId,
        outcome: TaskValidationOutcome,
        comments: &str,
        revision_cycle: u32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskValidationId::new(),
            task_id,
            qa_id,
            outcome,
            comments: comments.trim().to_owned(),
            revision_cycle,
            validated_at: at,
        }
    }

    /// Reconstructs a validation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskValidationData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            qa_id: data.qa_id,
            outcome: data.outcome,
            comments: data.comments,
            revision_cycle: data.revision_cycle,
            validated_at: data.validated_at,
        }
    }

    /// Returns the validation identifier.
    #[must_use]
    pub const fn id(&self) -> TaskValidationId {
        self.id
    }

    /// Returns the validated task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the deciding QA specialist.
    #[must_use]
    pub const fn qa_id(&self) -> UserId {
        self.qa_id
    }

    /// Returns the outcome.
    #[must_use]
    pub const fn outcome(&self) -> TaskValidationOutcome {
        self.outcome
    }

    /// Returns the QA explanation.
    #[must_use]
    pub fn comments(&self) -> &str {
        &self.comments
    }

    /// Returns the revision cycle the decision belongs to.
    #[must_use]
    pub const fn revision_cycle(&self) -> u32 {
        self.revision_cycle
    }

    /// Returns the decision timestamp.
    #[must_use]
    pub const fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }
}
