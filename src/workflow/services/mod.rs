//! Application services for the UAT validation and revision workflow.
//!
//! Each service wraps a [`WorkflowRepository`](crate::workflow::ports::WorkflowRepository)
//! and a clock. Mutations are expressed as domain commands and committed
//! through the repository's atomic `execute`, so every gate is re-checked
//! against the state it is committed with.

mod bug_reports;
mod bug_validation;
mod dispatch;
mod error;
mod evidence;
mod execution;
mod readiness;
mod revision;
mod task_validation;

pub use bug_reports::BugReportService;
pub use bug_validation::{BugValidationService, ValidateBugRequest};
pub use error::{WorkflowServiceError, WorkflowServiceResult};
pub use evidence::EvidenceService;
pub use execution::{AssignTaskRequest, TaskExecutionService};
pub use readiness::TaskReadinessService;
pub use revision::RevisionService;
pub use task_validation::{AppliedTaskValidation, TaskValidationRequest, TaskValidationService};
