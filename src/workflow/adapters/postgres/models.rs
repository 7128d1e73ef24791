//! Diesel row models for workflow persistence.

use super::schema::{bug_reports, bug_validations, task_validations, test_evidence, uat_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Row model for `uat_tasks`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = uat_tasks)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Application under test.
    pub app_id: Uuid,
    /// Executed test case.
    pub test_case_id: Uuid,
    /// Assigned worker.
    pub worker_id: Uuid,
    /// Lifecycle status.
    pub status: String,
    /// When the worker started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the task last reached `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of revisions requested.
    pub revision_count: i32,
    /// Revision cycle status.
    pub revision_status: String,
    /// QA explanation for the latest revision request.
    pub revision_comments: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for `bug_reports`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bug_reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BugReportRow {
    /// Bug report identifier.
    pub id: Uuid,
    /// Owning task.
    pub task_id: Uuid,
    /// Reporting worker.
    pub worker_id: Uuid,
    /// Defect description.
    pub description: String,
    /// Reproduction steps.
    pub steps_to_reproduce: String,
    /// Severity.
    pub severity: String,
    /// Position in the revision chain.
    pub revision_number: i32,
    /// Superseded report, for revisions.
    pub original_bug_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row model for `bug_validations`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bug_validations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BugValidationRow {
    /// Validation identifier.
    pub id: Uuid,
    /// Validated bug report.
    pub bug_report_id: Uuid,
    /// Deciding QA specialist.
    pub qa_id: Uuid,
    /// Determination.
    pub status: String,
    /// QA explanation.
    pub comments: String,
    /// Decision timestamp.
    pub validated_at: DateTime<Utc>,
}

/// Row model for `task_validations`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_validations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskValidationRow {
    /// Validation identifier.
    pub id: Uuid,
    /// Validated task.
    pub task_id: Uuid,
    /// Deciding QA specialist.
    pub qa_id: Uuid,
    /// Outcome.
    pub outcome: String,
    /// QA explanation.
    pub comments: String,
    /// Revision cycle the decision belongs to.
    pub revision_cycle: i32,
    /// Decision timestamp.
    pub validated_at: DateTime<Utc>,
}

/// Row model for `test_evidence`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = test_evidence)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EvidenceRow {
    /// Evidence identifier.
    pub id: Uuid,
    /// Owning task, for task-level evidence.
    pub task_id: Option<Uuid>,
    /// Owning bug report, for bug-level evidence.
    pub bug_report_id: Option<Uuid>,
    /// One-based step number.
    pub step_number: i32,
    /// Step description.
    pub step_description: String,
    /// Screenshot reference.
    pub screenshot_ref: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Given/When/Then context.
    pub context: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}
