//! Conversions between domain records and Diesel rows.

use super::models::{BugReportRow, BugValidationRow, EvidenceRow, TaskRow, TaskValidationRow};
use crate::workflow::{
    domain::{
        ApplicationId, BugReport, BugReportId, BugValidation, BugValidationId,
        BugValidationStatus, EvidenceId, EvidenceOwner, PersistedBugReportData,
        PersistedBugValidationData, PersistedEvidenceData, PersistedTaskData,
        PersistedTaskValidationData, RevisionStatus, Severity, StepContext, StepNumber, TaskId,
        TaskStatus, TaskValidation, TaskValidationId, TaskValidationOutcome, TestCaseId,
        TestEvidence, UatTask, UserId,
    },
    ports::{WorkflowRepositoryError, WorkflowRepositoryResult},
};

fn to_column(value: u32) -> WorkflowRepositoryResult<i32> {
    i32::try_from(value).map_err(WorkflowRepositoryError::persistence)
}

fn from_column(value: i32) -> WorkflowRepositoryResult<u32> {
    u32::try_from(value).map_err(WorkflowRepositoryError::persistence)
}

pub(super) fn task_to_row(task: &UatTask) -> WorkflowRepositoryResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        app_id: task.app_id().into_inner(),
        test_case_id: task.test_case_id().into_inner(),
        worker_id: task.worker_id().into_inner(),
        status: task.status().as_str().to_owned(),
        started_at: task.started_at(),
        completed_at: task.completed_at(),
        revision_count: to_column(task.revision_count())?,
        revision_status: task.revision_status().as_str().to_owned(),
        revision_comments: task.revision_comments().map(str::to_owned),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> WorkflowRepositoryResult<UatTask> {
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(WorkflowRepositoryError::persistence)?;
    let revision_status = RevisionStatus::try_from(row.revision_status.as_str())
        .map_err(WorkflowRepositoryError::persistence)?;
    Ok(UatTask::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        app_id: ApplicationId::from_uuid(row.app_id),
        test_case_id: TestCaseId::from_uuid(row.test_case_id),
        worker_id: UserId::from_uuid(row.worker_id),
        status,
        started_at: row.started_at,
        completed_at: row.completed_at,
        revision_count: from_column(row.revision_count)?,
        revision_status,
        revision_comments: row.revision_comments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn bug_report_to_row(bug: &BugReport) -> WorkflowRepositoryResult<BugReportRow> {
    Ok(BugReportRow {
        id: bug.id().into_inner(),
        task_id: bug.task_id().into_inner(),
        worker_id: bug.worker_id().into_inner(),
        description: bug.description().to_owned(),
        steps_to_reproduce: bug.steps_to_reproduce().to_owned(),
        severity: bug.severity().as_str().to_owned(),
        revision_number: to_column(bug.revision_number())?,
        original_bug_id: bug.original_bug_id().map(BugReportId::into_inner),
        created_at: bug.created_at(),
    })
}

pub(super) fn row_to_bug_report(row: BugReportRow) -> WorkflowRepositoryResult<BugReport> {
    let severity =
        Severity::try_from(row.severity.as_str()).map_err(WorkflowRepositoryError::persistence)?;
    Ok(BugReport::from_persisted(PersistedBugReportData {
        id: BugReportId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        worker_id: UserId::from_uuid(row.worker_id),
        description: row.description,
        steps_to_reproduce: row.steps_to_reproduce,
        severity,
        revision_number: from_column(row.revision_number)?,
        original_bug_id: row.original_bug_id.map(BugReportId::from_uuid),
        created_at: row.created_at,
    }))
}

pub(super) fn bug_validation_to_row(validation: &BugValidation) -> BugValidationRow {
    BugValidationRow {
        id: validation.id().into_inner(),
        bug_report_id: validation.bug_report_id().into_inner(),
        qa_id: validation.qa_id().into_inner(),
        status: validation.status().as_str().to_owned(),
        comments: validation.comments().to_owned(),
        validated_at: validation.validated_at(),
    }
}

pub(super) fn row_to_bug_validation(
    row: BugValidationRow,
) -> WorkflowRepositoryResult<BugValidation> {
    let status = BugValidationStatus::try_from(row.status.as_str())
        .map_err(WorkflowRepositoryError::persistence)?;
    Ok(BugValidation::from_persisted(PersistedBugValidationData {
        id: BugValidationId::from_uuid(row.id),
        bug_report_id: BugReportId::from_uuid(row.bug_report_id),
        qa_id: UserId::from_uuid(row.qa_id),
        status,
        comments: row.comments,
        validated_at: row.validated_at,
    }))
}

pub(super) fn task_validation_to_row(
    validation: &TaskValidation,
) -> WorkflowRepositoryResult<TaskValidationRow> {
    Ok(TaskValidationRow {
        id: validation.id().into_inner(),
        task_id: validation.task_id().into_inner(),
        qa_id: validation.qa_id().into_inner(),
        outcome: validation.outcome().as_str().to_owned(),
        comments: validation.comments().to_owned(),
        revision_cycle: to_column(validation.revision_cycle())?,
        validated_at: validation.validated_at(),
    })
}

pub(super) fn row_to_task_validation(
    row: TaskValidationRow,
) -> WorkflowRepositoryResult<TaskValidation> {
    let outcome = TaskValidationOutcome::try_from(row.outcome.as_str())
        .map_err(WorkflowRepositoryError::persistence)?;
    Ok(TaskValidation::from_persisted(PersistedTaskValidationData {
        id: TaskValidationId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        qa_id: UserId::from_uuid(row.qa_id),
        outcome,
        comments: row.comments,
        revision_cycle: from_column(row.revision_cycle)?,
        validated_at: row.validated_at,
    }))
}

pub(super) fn evidence_to_row(item: &TestEvidence) -> WorkflowRepositoryResult<EvidenceRow> {
    let (task_id, bug_report_id) = match item.owner() {
        EvidenceOwner::Task(id) => (Some(id.into_inner()), None),
        EvidenceOwner::BugReport(id) => (None, Some(id.into_inner())),
    };
    Ok(EvidenceRow {
        id: item.id().into_inner(),
        task_id,
        bug_report_id,
        step_number: to_column(item.step_number().value())?,
        step_description: item.step_description().to_owned(),
        screenshot_ref: item.screenshot_ref().map(str::to_owned),
        notes: item.notes().map(str::to_owned),
        context: item.context().map(|context| context.as_str().to_owned()),
        created_at: item.created_at(),
        updated_at: item.updated_at(),
    })
}

pub(super) fn row_to_evidence(row: EvidenceRow) -> WorkflowRepositoryResult<TestEvidence> {
    let owner = match (row.task_id, row.bug_report_id) {
        (Some(task_id), None) => EvidenceOwner::Task(TaskId::from_uuid(task_id)),
        (None, Some(bug_id)) => EvidenceOwner::BugReport(BugReportId::from_uuid(bug_id)),
        _ => {
            return Err(WorkflowRepositoryError::persistence(std::io::Error::other(
                format!("evidence {} must have exactly one owner", row.id),
            )));
        }
    };
    let step_number = StepNumber::new(from_column(row.step_number)?)
        .map_err(WorkflowRepositoryError::persistence)?;
    let context = row
        .context
        .as_deref()
        .map(StepContext::try_from)
        .transpose()
        .map_err(WorkflowRepositoryError::persistence)?;
    Ok(TestEvidence::from_persisted(PersistedEvidenceData {
        id: EvidenceId::from_uuid(row.id),
        owner,
        step_number,
        step_description: row.step_description,
        screenshot_ref: row.screenshot_ref,
        notes: row.notes,
        context,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
