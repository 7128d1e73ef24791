//! Service flows persisted through the `PostgreSQL` repository.

use crate::postgres::helpers::{PreparedWorkflow, prepare, test_runtime};
use crate::test_helpers::{bug_draft, evidence_draft};
use eyre::{Result, ensure};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use uatflow::workflow::{
    domain::{
        BugReport, BugValidationStatus, ErrorKind, EvidenceOwner, RevisionStatus, StepContext,
        TaskStatus, TaskValidationOutcome,
    },
    ports::WorkflowRepository,
};

#[rstest]
fn revision_cycle_survives_round_trip_through_postgres(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "revision_cycle")?;
    test_runtime()?.block_on(run_revision_cycle(&prepared))
}

#[rstest]
fn evidence_round_trips_with_optional_fields(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "evidence")?;
    test_runtime()?.block_on(round_trip_evidence(&prepared))
}

async fn run_revision_cycle(prepared: &PreparedWorkflow) -> Result<()> {
    let workflow = &prepared.workflow;

    let task = workflow.started_task().await?;
    let original = workflow.file_bug(task.id(), "report export times out").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    workflow
        .judge_bug(original.id(), BugValidationStatus::NeedsMoreInfo)
        .await?;
    workflow
        .decide(task.id(), TaskValidationOutcome::NeedRevision, "how large was the export?")
        .await?;
    workflow
        .revision
        .start_revision(workflow.worker, task.id())
        .await?;
    let revision = workflow
        .bugs
        .create_bug_revision(
            workflow.worker,
            original.id(),
            bug_draft("report export times out above 10k rows")?,
        )
        .await?;

    let snapshot = prepared
        .repository
        .load_snapshot(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task should be persisted"))?;
    ensure!(snapshot.task().status() == TaskStatus::RevisionRequired);
    ensure!(snapshot.task().revision_status() == RevisionStatus::InProgress);
    ensure!(snapshot.task().revision_count() == 1);
    ensure!(snapshot.bug_reports().len() == 2);
    ensure!(snapshot.readiness().unvalidated_bug_reports() == 1);
    ensure!(!workflow.readiness.check_readiness(task.id()).await?.is_ready());

    let chain = workflow.bugs.revision_chain(revision.id()).await?;
    ensure!(
        chain.iter().map(BugReport::id).collect::<Vec<_>>() == vec![revision.id(), original.id()]
    );

    workflow
        .judge_bug(revision.id(), BugValidationStatus::Valid)
        .await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    let passed = workflow
        .decide(task.id(), TaskValidationOutcome::PassVerified, "")
        .await?;
    ensure!(passed.task.status() == TaskStatus::Verified);

    let trail = workflow
        .task_validation
        .list_task_validations(task.id())
        .await?;
    ensure!(
        trail
            .iter()
            .map(|validation| validation.revision_cycle())
            .collect::<Vec<_>>()
            == vec![0, 1]
    );
    Ok(())
}

async fn round_trip_evidence(prepared: &PreparedWorkflow) -> Result<()> {
    let workflow = &prepared.workflow;
    let task = workflow.started_task().await?;
    let owner = EvidenceOwner::Task(task.id());

    let stored = workflow
        .evidence
        .put_evidence(
            workflow.worker,
            owner,
            evidence_draft(1, "open the reports page")?
                .with_screenshot("blob://evidence/reports.png")
                .with_notes("firefox 131")
                .with_context(StepContext::Given),
        )
        .await?;
    let fetched = prepared
        .repository
        .find_evidence(stored.id())
        .await?
        .ok_or_else(|| eyre::eyre!("evidence should be persisted"))?;
    ensure!(fetched.owner() == owner);
    ensure!(fetched.screenshot_ref() == Some("blob://evidence/reports.png"));
    ensure!(fetched.notes() == Some("firefox 131"));
    ensure!(fetched.context() == Some(StepContext::Given));

    workflow
        .evidence
        .delete_evidence(workflow.worker, stored.id())
        .await?;
    ensure!(workflow.evidence.list_evidence(owner).await?.is_empty());

    let refused = workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await;
    ensure!(
        refused.as_ref().err().and_then(|err| err.kind()) == Some(ErrorKind::InsufficientArtifacts)
    );
    Ok(())
}
