//! End-to-end validation and revision flows over the in-memory repository.

use crate::in_memory::helpers::{MemoryWorkflow, workflow};
use crate::test_helpers::{bug_draft, evidence_draft};
use eyre::{Result, bail, ensure};
use rstest::rstest;
use uatflow::workflow::{
    domain::{
        BugValidationStatus, ErrorKind, EvidenceOwner, RevisionStatus, TaskStatus,
        TaskValidationOutcome,
    },
    services::WorkflowServiceError,
};

fn kind_of<T>(result: &Result<T, WorkflowServiceError>) -> Option<ErrorKind> {
    result.as_ref().err().and_then(WorkflowServiceError::kind)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_without_artifacts_cannot_complete(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;

    ensure!(!workflow.execution.can_complete(task.id()).await?);
    ensure!(!workflow.execution.can_complete(task.id()).await?);
    let result = workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await;
    ensure!(kind_of(&result) == Some(ErrorKind::InsufficientArtifacts));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unvalidated_bug_blocks_readiness(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;
    workflow.file_bug(task.id(), "checkout total is wrong").await?;

    let report = workflow.readiness.check_readiness(task.id()).await?;
    ensure!(!report.is_ready());
    ensure!(report.total_bug_reports() == 1);
    ensure!(report.validated_bug_reports() == 0);
    ensure!(report.unvalidated_bug_reports() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn adding_a_bug_flips_readiness_off(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;
    ensure!(workflow.readiness.check_readiness(task.id()).await?.is_ready());

    let bug = workflow.file_bug(task.id(), "checkout total is wrong").await?;
    ensure!(!workflow.readiness.check_readiness(task.id()).await?.is_ready());

    workflow
        .judge_bug(bug.id(), BugValidationStatus::Invalid)
        .await?;
    ensure!(workflow.readiness.check_readiness(task.id()).await?.is_ready());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn revision_round_trip_ends_verified(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;
    let original = workflow.file_bug(task.id(), "checkout total is wrong").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;

    // Needs more info unlocks the task decision.
    workflow
        .judge_bug(original.id(), BugValidationStatus::NeedsMoreInfo)
        .await?;
    ensure!(workflow.readiness.check_readiness(task.id()).await?.is_ready());
    let applied = workflow
        .decide(task.id(), TaskValidationOutcome::NeedRevision, "please add logs")
        .await?;
    ensure!(applied.task.status() == TaskStatus::RevisionRequired);
    ensure!(applied.task.revision_status() == RevisionStatus::Requested);
    ensure!(applied.task.revision_count() == 1);
    ensure!(applied.task.revision_comments() == Some("please add logs"));

    // The worker reopens the cycle and supersedes the flagged bug.
    let revising = workflow
        .revision
        .start_revision(workflow.worker, task.id())
        .await?;
    ensure!(revising.revision_status() == RevisionStatus::InProgress);
    let revision = workflow
        .bugs
        .create_bug_revision(
            workflow.worker,
            original.id(),
            bug_draft("checkout total is wrong when a coupon is applied")?,
        )
        .await?;
    ensure!(revision.revision_number() == 2);
    ensure!(revision.original_bug_id() == Some(original.id()));
    let report = workflow.readiness.check_readiness(task.id()).await?;
    ensure!(report.total_bug_reports() == 1);
    ensure!(!report.is_ready());

    // Validate the revision, resubmit, and pass.
    workflow
        .judge_bug(revision.id(), BugValidationStatus::Valid)
        .await?;
    let resubmitted = workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    ensure!(resubmitted.status() == TaskStatus::Completed);
    ensure!(resubmitted.revision_status() == RevisionStatus::Completed);
    let passed = workflow
        .decide(task.id(), TaskValidationOutcome::PassVerified, "")
        .await?;
    ensure!(passed.task.status() == TaskStatus::Verified);
    ensure!(passed.validation.revision_cycle() == 1);

    let again = workflow
        .decide(task.id(), TaskValidationOutcome::Rejected, "changed my mind")
        .await;
    let Err(err) = again else {
        bail!("a verified task must not accept another decision");
    };
    let Some(source) = err.downcast_ref::<WorkflowServiceError>() else {
        bail!("unexpected error type: {err}");
    };
    ensure!(source.kind() == Some(ErrorKind::InvalidTransition));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn need_revision_requires_comments(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;
    workflow
        .evidence
        .put_evidence(
            workflow.worker,
            EvidenceOwner::Task(task.id()),
            evidence_draft(1, "completed checkout with a test card")?,
        )
        .await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;

    let result = workflow
        .decide(task.id(), TaskValidationOutcome::NeedRevision, "  ")
        .await;
    let Err(err) = result else {
        bail!("need revision without comments must fail");
    };
    let Some(source) = err.downcast_ref::<WorkflowServiceError>() else {
        bail!("unexpected error type: {err}");
    };
    ensure!(source.kind() == Some(ErrorKind::CommentsRequired));

    let task = workflow.execution.find_task(task.id()).await?;
    ensure!(task.map(|found| found.status()) == Some(TaskStatus::Completed));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_task_is_final(workflow: MemoryWorkflow) -> Result<()> {
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "images fail to load").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    workflow
        .judge_bug(bug.id(), BugValidationStatus::Invalid)
        .await?;
    let rejected = workflow
        .decide(task.id(), TaskValidationOutcome::Rejected, "")
        .await?;
    ensure!(rejected.task.status() == TaskStatus::Rejected);

    let revision = workflow
        .revision
        .start_revision(workflow.worker, task.id())
        .await;
    ensure!(kind_of(&revision) == Some(ErrorKind::InvalidTransition));
    let late_bug = workflow
        .bugs
        .create_bug_report(workflow.worker, task.id(), bug_draft("one more thing")?)
        .await;
    ensure!(kind_of(&late_bug) == Some(ErrorKind::InvalidTransition));
    Ok(())
}
