//! Bug reports and their revision chains.

use super::{BugReportId, ParseWorkflowValueError, TaskId, UserId, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Impact of a reported defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic or minor issue.
    Low,
    /// Degraded behaviour with a workaround.
    Medium,
    /// Broken feature without a workaround.
    High,
    /// Data loss, crash, or security impact.
    Critical,
}

impl Severity {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Severity {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseWorkflowValueError::new("severity", value)),
        }
    }
}

/// Worker-supplied content of a bug report or bug revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReportDraft {
    description: String,
    steps_to_reproduce: String,
    severity: Severity,
}

impl BugReportDraft {
    /// Creates a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::EmptyField`] when the description is blank.
    pub fn new(
        description: impl Into<String>,
        steps_to_reproduce: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, WorkflowError> {
        let raw_description = description.into();
        let trimmed = raw_description.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::EmptyField("bug description"));
        }
        Ok(Self {
            description: trimmed.to_owned(),
            steps_to_reproduce: steps_to_reproduce.into().trim().to_owned(),
            severity,
        })
    }

    /// Returns the defect description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the reproduction steps.
    #[must_use]
    pub fn steps_to_reproduce(&self) -> &str {
        &self.steps_to_reproduce
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }
}

/// A defect filed against a task.
///
/// Bug reports are never edited after creation. A revision is a new report
/// whose `original_bug_id` points at the report it supersedes, forming a
/// singly linked chain from the latest revision back to the first filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    id: BugReportId,
    task_id: TaskId,
    worker_id: UserId,
    description: String,
    steps_to_reproduce: String,
    severity: Severity,
    revision_number: u32,
    original_bug_id: Option<BugReportId>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted bug report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBugReportData {
    /// Persisted identifier.
    pub id: BugReportId,
    /// Owning task.
    pub task_id: TaskId,
    /// Reporting worker.
    pub worker_id: UserId,
    /// Defect description.
    pub description: String,
    /// Reproduction steps.
    pub steps_to_reproduce: String,
    /// Severity.
    pub severity: Severity,
    /// Position in the revision chain, starting at one.
    pub revision_number: u32,
    /// Report superseded by this one, if this is a revision.
    pub original_bug_id: Option<BugReportId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BugReport {
    /// Creates a first-time report for a task.
    #[must_use]
    pub fn file(
        task_id: TaskId,
        worker_id: UserId,
        draft: BugReportDraft,
        at: DateTime<Utc>,
    ) -> Self {
        Self::build(task_id, worker_id, draft, 1, None, at)
    }

    /// Creates a revision superseding `original`.
    ///
    /// The revision inherits the original's task; `revision_number` is the
    /// highest number in the chain plus one.
    #[must_use]
    pub fn revise(
        original: &Self,
        chain_max_revision: u32,
        worker_id: UserId,
        draft: BugReportDraft,
        at: DateTime<Utc>,
    ) -> Self {
        Self::build(
            original.task_id,
            worker_id,
            draft,
            chain_max_revision.saturating_add(1),
            Some(original.id),
            at,
        )
    }

    fn build(
        task_id: TaskId,
        worker_id: UserId,
        draft: BugReportDraft,
        revision_number: u32,
        original_bug_id: Option<BugReportId>,
        at: DateTime<Utc>,
    ) -> Self {
        let BugReportDraft {
            description,
            steps_to_reproduce,
            severity,
        } = draft;
        Self {
            id: BugReportId::new(),
            task_id,
            worker_id,
            description,
            steps_to_reproduce,
            severity,
            revision_number,
            original_bug_id,
            created_at: at,
        }
    }

    /// Reconstructs a bug report from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBugReportData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            worker_id: data.worker_id,
            description: data.description,
            steps_to_reproduce: data.steps_to_reproduce,
            severity: data.severity,
            revision_number: data.revision_number,
            original_bug_id: data.original_bug_id,
            created_at: data.created_at,
        }
    }

    /// Returns the bug report identifier.
    #[must_use]
    pub const fn id(&self) -> BugReportId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the reporting worker.
    #[must_use]
    pub const fn worker_id(&self) -> UserId {
        self.worker_id
    }

    /// Returns the defect description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the reproduction steps.
    #[must_use]
    pub fn steps_to_reproduce(&self) -> &str {
        &self.steps_to_reproduce
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns `true` when this report supersedes an earlier one.
    #[must_use]
    pub const fn is_revision(&self) -> bool {
        self.original_bug_id.is_some()
    }

    /// Returns the position in the revision chain (first filing is `1`).
    #[must_use]
    pub const fn revision_number(&self) -> u32 {
        self.revision_number
    }

    /// Returns the superseded report, if this is a revision.
    #[must_use]
    pub const fn original_bug_id(&self) -> Option<BugReportId> {
        self.original_bug_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
