//! Domain model for UAT task validation and revision.
//!
//! The domain covers the task lifecycle, bug reports and their revision
//! chains, QA determinations, test evidence, and the gating rules that tie
//! them together. Gating is evaluated against a [`TaskSnapshot`] by
//! [`WorkflowCommand::plan`], which is pure and performs no I/O.

mod bug_report;
mod caller;
mod command;
mod error;
mod evidence;
mod ids;
mod readiness;
mod snapshot;
mod task;
mod validation;

pub use bug_report::{BugReport, BugReportDraft, PersistedBugReportData, Severity};
pub use caller::{Caller, Role};
pub use command::{RecordWrite, TaskChangeSet, WorkflowCommand};
pub use error::{
    EntityRef, ErrorKind, NotRevisableReason, ParseWorkflowValueError, TaskAction,
    UnauthorizedReason, WorkflowError,
};
pub use evidence::{
    EvidenceDraft, EvidenceOwner, PersistedEvidenceData, StepContext, StepNumber, TestEvidence,
};
pub use ids::{
    ApplicationId, BugReportId, BugValidationId, EvidenceId, TaskId, TaskValidationId, TestCaseId,
    UserId,
};
pub use readiness::{ArtifactSummary, ReadinessReport};
pub use snapshot::TaskSnapshot;
pub use task::{PersistedTaskData, RevisionStatus, TaskStatus, UatTask};
pub use validation::{
    BugValidation, BugValidationStatus, PersistedBugValidationData, PersistedTaskValidationData,
    TaskValidation, TaskValidationOutcome,
};
