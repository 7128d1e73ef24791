//! Shared service wiring and builders for workflow integration tests.

use std::sync::Arc;

use eyre::Result;
use mockable::DefaultClock;
use uatflow::workflow::{
    domain::{
        ApplicationId, BugReport, BugReportDraft, BugReportId, BugValidation,
        BugValidationStatus, Caller, EvidenceDraft, Severity, StepNumber, TaskId,
        TaskValidationOutcome, TestCaseId, UatTask, UserId,
    },
    ports::WorkflowRepository,
    services::{
        AppliedTaskValidation, AssignTaskRequest, BugReportService, BugValidationService,
        EvidenceService, RevisionService, TaskExecutionService, TaskReadinessService,
        TaskValidationRequest, TaskValidationService, ValidateBugRequest,
    },
};

/// Every workflow service wired to one shared repository, plus the worker
/// and QA specialist acting on it.
pub struct Workflow<R: WorkflowRepository> {
    pub worker: Caller,
    pub qa: Caller,
    pub execution: TaskExecutionService<R, DefaultClock>,
    pub bugs: BugReportService<R, DefaultClock>,
    pub bug_validation: BugValidationService<R, DefaultClock>,
    pub readiness: TaskReadinessService<R>,
    pub task_validation: TaskValidationService<R, DefaultClock>,
    pub revision: RevisionService<R, DefaultClock>,
    pub evidence: EvidenceService<R, DefaultClock>,
}

impl<R: WorkflowRepository> Workflow<R> {
    /// Wires every service to `repository`.
    pub fn new(repository: Arc<R>) -> Self {
        let clock = Arc::new(DefaultClock);
        Self {
            worker: Caller::worker(UserId::new()),
            qa: Caller::qa_specialist(UserId::new()),
            execution: TaskExecutionService::new(Arc::clone(&repository), Arc::clone(&clock)),
            bugs: BugReportService::new(Arc::clone(&repository), Arc::clone(&clock)),
            bug_validation: BugValidationService::new(Arc::clone(&repository), Arc::clone(&clock)),
            readiness: TaskReadinessService::new(Arc::clone(&repository)),
            task_validation: TaskValidationService::new(
                Arc::clone(&repository),
                Arc::clone(&clock),
            ),
            revision: RevisionService::new(Arc::clone(&repository), Arc::clone(&clock)),
            evidence: EvidenceService::new(repository, clock),
        }
    }

    /// Assigns a fresh task to the worker and starts it.
    pub async fn started_task(&self) -> Result<UatTask> {
        let request = AssignTaskRequest::new(ApplicationId::new(), TestCaseId::new());
        let task = self.execution.assign_task(self.worker, request).await?;
        Ok(self.execution.start_task(self.worker, task.id()).await?)
    }

    /// Files a first-time bug report as the worker.
    pub async fn file_bug(&self, task_id: TaskId, description: &str) -> Result<BugReport> {
        Ok(self
            .bugs
            .create_bug_report(self.worker, task_id, bug_draft(description)?)
            .await?)
    }

    /// Records a QA determination on a bug report.
    pub async fn judge_bug(
        &self,
        bug_id: BugReportId,
        status: BugValidationStatus,
    ) -> Result<BugValidation> {
        let request = ValidateBugRequest::new(bug_id, status, "checked against the test case");
        Ok(self.bug_validation.validate(self.qa, request).await?)
    }

    /// Records a QA decision on a completed task.
    pub async fn decide(
        &self,
        task_id: TaskId,
        outcome: TaskValidationOutcome,
        comments: &str,
    ) -> Result<AppliedTaskValidation> {
        let request = TaskValidationRequest::new(task_id, outcome).with_comments(comments);
        Ok(self
            .task_validation
            .apply_task_validation(self.qa, request)
            .await?)
    }
}

/// Builds a bug report draft with fixed reproduction steps.
pub fn bug_draft(description: &str) -> Result<BugReportDraft> {
    Ok(BugReportDraft::new(
        description,
        "1. open the app\n2. follow the test case",
        Severity::High,
    )?)
}

/// Builds an evidence draft for a step.
pub fn evidence_draft(step: u32, description: &str) -> Result<EvidenceDraft> {
    Ok(EvidenceDraft::new(StepNumber::new(step)?, description)?)
}
