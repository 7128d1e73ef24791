//! Consistent view of one task and every record it owns.

use super::{
    ArtifactSummary, BugReport, BugReportId, BugValidation, EntityRef, EvidenceId, EvidenceOwner,
    ReadinessReport, TaskValidation, TestEvidence, UatTask, WorkflowError,
};
use std::collections::HashSet;

/// A task together with its bug reports, validations, and evidence, read at
/// a single point in time.
///
/// All gating rules are evaluated against a snapshot so that a decision and
/// the state it was based on can be committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    task: UatTask,
    bug_reports: Vec<BugReport>,
    bug_validations: Vec<BugValidation>,
    evidence: Vec<TestEvidence>,
    task_validations: Vec<TaskValidation>,
}

impl TaskSnapshot {
    /// Assembles a snapshot from records loaded by an adapter.
    #[must_use]
    pub const fn from_parts(
        task: UatTask,
        bug_reports: Vec<BugReport>,
        bug_validations: Vec<BugValidation>,
        evidence: Vec<TestEvidence>,
        task_validations: Vec<TaskValidation>,
    ) -> Self {
        Self {
            task,
            bug_reports,
            bug_validations,
            evidence,
            task_validations,
        }
    }

    /// Creates a snapshot of a task without any owned records.
    #[must_use]
    pub const fn empty(task: UatTask) -> Self {
        Self::from_parts(task, Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    /// Returns the task.
    #[must_use]
    pub const fn task(&self) -> &UatTask {
        &self.task
    }

    /// Returns every bug report, including superseded ones.
    #[must_use]
    pub fn bug_reports(&self) -> &[BugReport] {
        &self.bug_reports
    }

    /// Returns every bug validation for the task's bug reports.
    #[must_use]
    pub fn bug_validations(&self) -> &[BugValidation] {
        &self.bug_validations
    }

    /// Returns all evidence owned by the task or its bug reports.
    #[must_use]
    pub fn evidence(&self) -> &[TestEvidence] {
        &self.evidence
    }

    /// Returns the task validation audit trail.
    #[must_use]
    pub fn task_validations(&self) -> &[TaskValidation] {
        &self.task_validations
    }

    /// Finds a bug report of this task.
    #[must_use]
    pub fn bug_report(&self, id: BugReportId) -> Option<&BugReport> {
        self.bug_reports.iter().find(|bug| bug.id() == id)
    }

    /// Finds a bug report of this task or returns `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] when the report does not belong to
    /// this task.
    pub fn require_bug_report(&self, id: BugReportId) -> Result<&BugReport, WorkflowError> {
        self.bug_report(id)
            .ok_or(WorkflowError::NotFound(EntityRef::BugReport(id)))
    }

    /// Returns the validation of a bug report, if any.
    #[must_use]
    pub fn validation_for(&self, id: BugReportId) -> Option<&BugValidation> {
        self.bug_validations
            .iter()
            .find(|validation| validation.bug_report_id() == id)
    }

    /// Returns the revision that supersedes a bug report, if any.
    #[must_use]
    pub fn superseded_by(&self, id: BugReportId) -> Option<&BugReport> {
        self.bug_reports
            .iter()
            .find(|bug| bug.original_bug_id() == Some(id))
    }

    /// Returns the latest revision of every chain.
    #[must_use]
    pub fn current_bug_reports(&self) -> Vec<&BugReport> {
        let superseded: HashSet<BugReportId> = self
            .bug_reports
            .iter()
            .filter_map(BugReport::original_bug_id)
            .collect();
        self.bug_reports
            .iter()
            .filter(|bug| !superseded.contains(&bug.id()))
            .collect()
    }

    /// Computes QA readiness over current bug reports.
    #[must_use]
    pub fn readiness(&self) -> ReadinessReport {
        let current = self.current_bug_reports();
        let validated = current
            .iter()
            .filter(|bug| self.validation_for(bug.id()).is_some())
            .count();
        ReadinessReport::new(self.task.id(), current.len(), validated)
    }

    /// Counts the artifacts consulted by the completion gate.
    #[must_use]
    pub fn artifacts(&self) -> ArtifactSummary {
        let task_owner = EvidenceOwner::Task(self.task.id());
        ArtifactSummary {
            current_bug_reports: self.current_bug_reports().len(),
            task_evidence: self
                .evidence
                .iter()
                .filter(|item| item.owner() == task_owner)
                .count(),
        }
    }

    /// Returns `true` when the completion gate would admit the task.
    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.artifacts().permits_completion()
    }

    /// Walks the revision chain from `id` back to its first filing.
    ///
    /// The returned list starts with `id` and ends with the root report.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] when `id` is not a bug of this
    /// task and [`WorkflowError::CorruptRevisionChain`] when a pointer leaves
    /// the task or revisits a report.
    pub fn revision_chain(&self, id: BugReportId) -> Result<Vec<&BugReport>, WorkflowError> {
        let mut chain = vec![self.require_bug_report(id)?];
        let mut visited = HashSet::from([id]);
        let mut cursor = chain.last().and_then(|bug| bug.original_bug_id());

        while let Some(previous_id) = cursor {
            if !visited.insert(previous_id) {
                return Err(WorkflowError::CorruptRevisionChain(id));
            }
            let previous = self
                .bug_report(previous_id)
                .ok_or(WorkflowError::CorruptRevisionChain(id))?;
            cursor = previous.original_bug_id();
            chain.push(previous);
        }
        Ok(chain)
    }

    /// Returns evidence owned by `owner`, ordered by step number.
    #[must_use]
    pub fn evidence_for(&self, owner: EvidenceOwner) -> Vec<&TestEvidence> {
        let mut items: Vec<&TestEvidence> = self
            .evidence
            .iter()
            .filter(|item| item.owner() == owner)
            .collect();
        items.sort_by_key(|item| (item.step_number(), item.created_at()));
        items
    }

    /// Finds an evidence item owned by the task or one of its bugs.
    #[must_use]
    pub fn evidence_item(&self, id: EvidenceId) -> Option<&TestEvidence> {
        self.evidence.iter().find(|item| item.id() == id)
    }
}
