//! Mutating workflow commands and the change sets they plan.
//!
//! Planning is pure: a command is checked against a [`TaskSnapshot`] and
//! produces a [`TaskChangeSet`] describing the writes to commit. Adapters run
//! planning and persistence inside one critical section, so every decision is
//! committed against the exact state it was evaluated on.

use super::{
    BugReport, BugReportDraft, BugReportId, BugValidation, BugValidationStatus, Caller, EntityRef,
    EvidenceDraft, EvidenceId, EvidenceOwner, NotRevisableReason, Role, TaskAction, TaskSnapshot,
    TaskStatus, TaskValidation, TaskValidationOutcome, TestEvidence, UatTask, WorkflowError,
};
use chrono::{DateTime, Utc};

/// A state-changing request against one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCommand {
    /// `assigned → in_progress`.
    StartTask {
        /// Requesting worker.
        caller: Caller,
    },
    /// Submit the task for QA, first time or after a revision.
    CompleteTask {
        /// Requesting worker.
        caller: Caller,
    },
    /// File a first-time bug report.
    FileBugReport {
        /// Requesting worker.
        caller: Caller,
        /// Report content.
        draft: BugReportDraft,
    },
    /// File a revision of a bug QA flagged as needing more information.
    ReviseBugReport {
        /// Requesting worker.
        caller: Caller,
        /// Report being superseded.
        original_bug_id: BugReportId,
        /// Revised content.
        draft: BugReportDraft,
    },
    /// Record the single QA determination on a bug report.
    ValidateBug {
        /// Deciding QA specialist.
        caller: Caller,
        /// Bug report under validation.
        bug_report_id: BugReportId,
        /// Determination.
        status: BugValidationStatus,
        /// Mandatory explanation.
        comments: String,
    },
    /// Record the QA determination on a completed task.
    ApplyTaskValidation {
        /// Deciding QA specialist.
        caller: Caller,
        /// Outcome.
        outcome: TaskValidationOutcome,
        /// Explanation; mandatory for `need_revision`.
        comments: String,
    },
    /// `requested → in_progress` on the revision cycle.
    StartRevision {
        /// Requesting worker.
        caller: Caller,
    },
    /// Attach evidence to the task or one of its bug reports.
    AttachEvidence {
        /// Requesting worker.
        caller: Caller,
        /// Owning record.
        owner: EvidenceOwner,
        /// Evidence content.
        draft: EvidenceDraft,
    },
    /// Replace the content of an evidence item.
    ReviseEvidence {
        /// Requesting worker.
        caller: Caller,
        /// Evidence being edited.
        evidence_id: EvidenceId,
        /// New content.
        draft: EvidenceDraft,
    },
    /// Delete an evidence item.
    RemoveEvidence {
        /// Requesting worker.
        caller: Caller,
        /// Evidence being deleted.
        evidence_id: EvidenceId,
    },
}

/// A single record write produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordWrite {
    /// Insert a bug report or bug revision.
    InsertBugReport(BugReport),
    /// Insert a bug validation; unique per bug report.
    InsertBugValidation(BugValidation),
    /// Insert a task validation; unique per task and revision cycle.
    InsertTaskValidation(TaskValidation),
    /// Insert an evidence item.
    InsertEvidence(TestEvidence),
    /// Overwrite an evidence item.
    UpdateEvidence(TestEvidence),
    /// Delete an evidence item.
    DeleteEvidence(EvidenceId),
}

/// Writes planned by a command: the task row plus at most one owned record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChangeSet {
    task: UatTask,
    task_changed: bool,
    record: Option<RecordWrite>,
}

impl TaskChangeSet {
    const fn task_only(task: UatTask) -> Self {
        Self {
            task,
            task_changed: true,
            record: None,
        }
    }

    fn record_only(task: &UatTask, record: RecordWrite) -> Self {
        Self {
            task: task.clone(),
            task_changed: false,
            record: Some(record),
        }
    }

    const fn task_and_record(task: UatTask, record: RecordWrite) -> Self {
        Self {
            task,
            task_changed: true,
            record: Some(record),
        }
    }

    /// Returns the task as it stands after the change.
    #[must_use]
    pub const fn task(&self) -> &UatTask {
        &self.task
    }

    /// Returns `true` when the task row must be rewritten.
    #[must_use]
    pub const fn task_changed(&self) -> bool {
        self.task_changed
    }

    /// Returns the owned-record write, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&RecordWrite> {
        self.record.as_ref()
    }

    /// Returns the inserted bug report, if the command filed one.
    #[must_use]
    pub const fn bug_report(&self) -> Option<&BugReport> {
        match &self.record {
            Some(RecordWrite::InsertBugReport(bug)) => Some(bug),
            _ => None,
        }
    }

    /// Returns the inserted bug validation, if the command recorded one.
    #[must_use]
    pub const fn bug_validation(&self) -> Option<&BugValidation> {
        match &self.record {
            Some(RecordWrite::InsertBugValidation(validation)) => Some(validation),
            _ => None,
        }
    }

    /// Returns the inserted task validation, if the command recorded one.
    #[must_use]
    pub const fn task_validation(&self) -> Option<&TaskValidation> {
        match &self.record {
            Some(RecordWrite::InsertTaskValidation(validation)) => Some(validation),
            _ => None,
        }
    }

    /// Returns the inserted or rewritten evidence item.
    #[must_use]
    pub const fn evidence(&self) -> Option<&TestEvidence> {
        match &self.record {
            Some(RecordWrite::InsertEvidence(item) | RecordWrite::UpdateEvidence(item)) => {
                Some(item)
            }
            _ => None,
        }
    }
}

impl WorkflowCommand {
    /// Returns the caller issuing the command.
    #[must_use]
    pub const fn caller(&self) -> &Caller {
        match self {
            Self::StartTask { caller }
            | Self::CompleteTask { caller }
            | Self::FileBugReport { caller, .. }
            | Self::ReviseBugReport { caller, .. }
            | Self::ValidateBug { caller, .. }
            | Self::ApplyTaskValidation { caller, .. }
            | Self::StartRevision { caller }
            | Self::AttachEvidence { caller, .. }
            | Self::ReviseEvidence { caller, .. }
            | Self::RemoveEvidence { caller, .. } => caller,
        }
    }

    /// Returns the action the command performs.
    #[must_use]
    pub const fn action(&self) -> TaskAction {
        match self {
            Self::StartTask { .. } => TaskAction::Start,
            Self::CompleteTask { .. } => TaskAction::Complete,
            Self::FileBugReport { .. } | Self::ReviseBugReport { .. } => TaskAction::FileBugReport,
            Self::ValidateBug { .. } => TaskAction::ValidateBug,
            Self::ApplyTaskValidation { .. } => TaskAction::ApplyValidation,
            Self::StartRevision { .. } => TaskAction::StartRevision,
            Self::AttachEvidence { .. } => TaskAction::AttachEvidence,
            Self::ReviseEvidence { .. } | Self::RemoveEvidence { .. } => TaskAction::EditEvidence,
        }
    }

    /// Checks the command against `snapshot` and plans its writes.
    ///
    /// # Errors
    ///
    /// Returns the [`WorkflowError`] describing the first violated
    /// precondition. Nothing is written when planning fails.
    pub fn plan(
        self,
        snapshot: &TaskSnapshot,
        at: DateTime<Utc>,
    ) -> Result<TaskChangeSet, WorkflowError> {
        let current = snapshot.task();
        match self {
            Self::StartTask { caller } => {
                caller.require_worker(current.worker_id())?;
                let mut task = current.clone();
                task.start(at)?;
                Ok(TaskChangeSet::task_only(task))
            }
            Self::CompleteTask { caller } => {
                caller.require_worker(current.worker_id())?;
                let mut task = current.clone();
                task.complete(snapshot.artifacts(), at)?;
                Ok(TaskChangeSet::task_only(task))
            }
            Self::FileBugReport { caller, draft } => {
                caller.require_worker(current.worker_id())?;
                current.ensure_accepting_artifacts(TaskAction::FileBugReport)?;
                let bug = BugReport::file(current.id(), caller.user_id(), draft, at);
                Ok(TaskChangeSet::record_only(
                    current,
                    RecordWrite::InsertBugReport(bug),
                ))
            }
            Self::ReviseBugReport {
                caller,
                original_bug_id,
                draft,
            } => plan_bug_revision(snapshot, caller, original_bug_id, draft, at),
            Self::ValidateBug {
                caller,
                bug_report_id,
                status,
                comments,
            } => {
                caller.require_role(Role::QaSpecialist)?;
                snapshot.require_bug_report(bug_report_id)?;
                if current.status().is_terminal() {
                    return Err(current.invalid_transition(TaskAction::ValidateBug));
                }
                if snapshot.validation_for(bug_report_id).is_some() {
                    return Err(WorkflowError::AlreadyValidated(EntityRef::BugReport(
                        bug_report_id,
                    )));
                }
                let validation =
                    BugValidation::record(bug_report_id, caller.user_id(), status, &comments, at)?;
                Ok(TaskChangeSet::record_only(
                    current,
                    RecordWrite::InsertBugValidation(validation),
                ))
            }
            Self::ApplyTaskValidation {
                caller,
                outcome,
                comments,
            } => {
                caller.require_role(Role::QaSpecialist)?;
                if current.status() != TaskStatus::Completed {
                    return Err(current.invalid_transition(TaskAction::ApplyValidation));
                }
                let cycle = current.revision_count();
                if snapshot
                    .task_validations()
                    .iter()
                    .any(|validation| validation.revision_cycle() == cycle)
                {
                    return Err(WorkflowError::AlreadyValidated(EntityRef::Task(current.id())));
                }
                let mut task = current.clone();
                task.apply_validation(outcome, &comments, &snapshot.readiness(), at)?;
                let validation =
                    TaskValidation::record(task.id(), caller.user_id(), outcome, &comments, cycle, at);
                Ok(TaskChangeSet::task_and_record(
                    task,
                    RecordWrite::InsertTaskValidation(validation),
                ))
            }
            Self::StartRevision { caller } => {
                caller.require_worker(current.worker_id())?;
                let mut task = current.clone();
                task.start_revision(at)?;
                Ok(TaskChangeSet::task_only(task))
            }
            Self::AttachEvidence {
                caller,
                owner,
                draft,
            } => {
                caller.require_worker(current.worker_id())?;
                current.ensure_accepting_artifacts(TaskAction::AttachEvidence)?;
                match owner {
                    EvidenceOwner::Task(task_id) if task_id != current.id() => {
                        return Err(WorkflowError::NotFound(EntityRef::Task(task_id)));
                    }
                    EvidenceOwner::Task(_) => {}
                    EvidenceOwner::BugReport(bug_id) => {
                        snapshot.require_bug_report(bug_id)?;
                    }
                }
                let evidence = TestEvidence::attach(owner, draft, at);
                Ok(TaskChangeSet::record_only(
                    current,
                    RecordWrite::InsertEvidence(evidence),
                ))
            }
            Self::ReviseEvidence {
                caller,
                evidence_id,
                draft,
            } => {
                let existing = editable_evidence(snapshot, &caller, evidence_id)?;
                let mut evidence = existing.clone();
                evidence.replace_content(draft, at);
                Ok(TaskChangeSet::record_only(
                    current,
                    RecordWrite::UpdateEvidence(evidence),
                ))
            }
            Self::RemoveEvidence {
                caller,
                evidence_id,
            } => {
                editable_evidence(snapshot, &caller, evidence_id)?;
                Ok(TaskChangeSet::record_only(
                    current,
                    RecordWrite::DeleteEvidence(evidence_id),
                ))
            }
        }
    }
}

fn plan_bug_revision(
    snapshot: &TaskSnapshot,
    caller: Caller,
    original_bug_id: BugReportId,
    draft: BugReportDraft,
    at: DateTime<Utc>,
) -> Result<TaskChangeSet, WorkflowError> {
    let current = snapshot.task();
    caller.require_worker(current.worker_id())?;
    current.ensure_accepting_artifacts(TaskAction::FileBugReport)?;

    let original = snapshot.require_bug_report(original_bug_id)?;
    let not_revisable = |reason| WorkflowError::BugNotRevisable {
        bug_id: original_bug_id,
        reason,
    };
    if let Some(later) = snapshot.superseded_by(original_bug_id) {
        return Err(not_revisable(NotRevisableReason::Superseded(later.id())));
    }
    let validation = snapshot
        .validation_for(original_bug_id)
        .ok_or_else(|| not_revisable(NotRevisableReason::Unvalidated))?;
    if !validation.status().permits_revision() {
        return Err(not_revisable(NotRevisableReason::FinalDetermination(
            validation.status(),
        )));
    }

    let chain_max = snapshot
        .revision_chain(original_bug_id)?
        .iter()
        .map(|bug| bug.revision_number())
        .max()
        .unwrap_or_default();
    let revision = BugReport::revise(original, chain_max, caller.user_id(), draft, at);
    Ok(TaskChangeSet::record_only(
        current,
        RecordWrite::InsertBugReport(revision),
    ))
}

fn editable_evidence<'a>(
    snapshot: &'a TaskSnapshot,
    caller: &Caller,
    evidence_id: EvidenceId,
) -> Result<&'a TestEvidence, WorkflowError> {
    let task = snapshot.task();
    caller.require_worker(task.worker_id())?;
    let evidence = snapshot
        .evidence_item(evidence_id)
        .ok_or(WorkflowError::NotFound(EntityRef::Evidence(evidence_id)))?;
    if !task.is_evidence_editable() {
        return Err(task.invalid_transition(TaskAction::EditEvidence));
    }
    Ok(evidence)
}
