//! Derived gating values: QA readiness and completion artifacts.

use super::TaskId;
use serde::{Deserialize, Serialize};

/// Whether a task may be validated by QA.
///
/// Only current bug reports (chain tails) are counted; superseded reports
/// are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    task_id: TaskId,
    total_bug_reports: usize,
    validated_bug_reports: usize,
}

impl ReadinessReport {
    /// Builds a report from current bug report counts.
    ///
    /// `validated` is clamped to `total`.
    #[must_use]
    pub fn new(task_id: TaskId, total: usize, validated: usize) -> Self {
        Self {
            task_id,
            total_bug_reports: total,
            validated_bug_reports: validated.min(total),
        }
    }

    /// Returns the evaluated task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns `true` when every current bug report has a validation.
    ///
    /// A task without bug reports is ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.validated_bug_reports == self.total_bug_reports
    }

    /// Returns the number of current bug reports.
    #[must_use]
    pub const fn total_bug_reports(&self) -> usize {
        self.total_bug_reports
    }

    /// Returns the number of current bug reports with a validation.
    #[must_use]
    pub const fn validated_bug_reports(&self) -> usize {
        self.validated_bug_reports
    }

    /// Returns the number of current bug reports awaiting validation.
    #[must_use]
    pub const fn unvalidated_bug_reports(&self) -> usize {
        self.total_bug_reports.saturating_sub(self.validated_bug_reports)
    }
}

/// Artifacts recorded for a task, consulted by the completion gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArtifactSummary {
    /// Current (non-superseded) bug reports.
    pub current_bug_reports: usize,
    /// Evidence attached to the task itself.
    pub task_evidence: usize,
}

impl ArtifactSummary {
    /// Returns `true` when the task has recorded any output.
    #[must_use]
    pub const fn permits_completion(&self) -> bool {
        self.current_bug_reports > 0 || self.task_evidence > 0
    }
}
