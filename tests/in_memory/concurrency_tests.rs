//! Racing QA decisions and revision starts against one task.

use std::sync::Arc;

use crate::test_helpers::Workflow;
use eyre::{Result, ensure};
use rstest::rstest;
use tokio::task::JoinSet;
use uatflow::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{BugValidationStatus, ErrorKind, RevisionStatus, TaskValidationOutcome},
    services::{TaskValidationRequest, ValidateBugRequest, WorkflowServiceError},
};

/// Counts successes and collects the error kinds of failures.
fn tally<T>(results: Vec<Result<T, WorkflowServiceError>>) -> (usize, Vec<Option<ErrorKind>>) {
    let mut successes = 0;
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(_) => successes += 1,
            Err(err) => failures.push(err.kind()),
        }
    }
    (successes, failures)
}

#[rstest]
#[case(2)]
#[case(8)]
#[case(32)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_concurrent_bug_validation_wins(#[case] attempts: usize) -> Result<()> {
    let workflow = Arc::new(Workflow::new(Arc::new(InMemoryWorkflowRepository::new())));
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "cart empties on refresh").await?;

    let mut racers = JoinSet::new();
    for attempt in 0..attempts {
        let shared = Arc::clone(&workflow);
        let bug_id = bug.id();
        racers.spawn(async move {
            let status = if attempt % 2 == 0 {
                BugValidationStatus::Valid
            } else {
                BugValidationStatus::NeedsMoreInfo
            };
            let request = ValidateBugRequest::new(bug_id, status, format!("attempt {attempt}"));
            shared.bug_validation.validate(shared.qa, request).await
        });
    }
    let results = racers.join_all().await;

    let (successes, failures) = tally(results);
    ensure!(successes == 1, "expected one winner, got {successes}");
    ensure!(failures.len() == attempts - 1);
    ensure!(
        failures
            .iter()
            .all(|kind| *kind == Some(ErrorKind::AlreadyValidated)),
        "losers must see AlreadyValidated: {failures:?}"
    );
    ensure!(workflow.readiness.check_readiness(task.id()).await?.is_ready());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_concurrent_revision_start_wins() -> Result<()> {
    let workflow = Arc::new(Workflow::new(Arc::new(InMemoryWorkflowRepository::new())));
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "cart empties on refresh").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    workflow
        .judge_bug(bug.id(), BugValidationStatus::NeedsMoreInfo)
        .await?;
    workflow
        .decide(task.id(), TaskValidationOutcome::NeedRevision, "which browser?")
        .await?;

    let mut racers = JoinSet::new();
    for _ in 0..8 {
        let shared = Arc::clone(&workflow);
        let task_id = task.id();
        racers.spawn(async move { shared.revision.start_revision(shared.worker, task_id).await });
    }
    let (successes, failures) = tally(racers.join_all().await);

    ensure!(successes == 1, "expected one winner, got {successes}");
    ensure!(
        failures
            .iter()
            .all(|kind| *kind == Some(ErrorKind::InvalidTransition))
    );
    let stored = workflow.execution.find_task(task.id()).await?;
    ensure!(stored.map(|found| found.revision_status()) == Some(RevisionStatus::InProgress));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_task_decisions_record_one_outcome() -> Result<()> {
    let workflow = Arc::new(Workflow::new(Arc::new(InMemoryWorkflowRepository::new())));
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "cart empties on refresh").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    workflow
        .judge_bug(bug.id(), BugValidationStatus::Valid)
        .await?;

    let mut racers = JoinSet::new();
    for outcome in [
        TaskValidationOutcome::PassVerified,
        TaskValidationOutcome::Rejected,
        TaskValidationOutcome::PassVerified,
        TaskValidationOutcome::Rejected,
    ] {
        let shared = Arc::clone(&workflow);
        let task_id = task.id();
        racers.spawn(async move {
            shared
                .task_validation
                .apply_task_validation(shared.qa, TaskValidationRequest::new(task_id, outcome))
                .await
        });
    }
    let (successes, failures) = tally(racers.join_all().await);

    ensure!(successes == 1);
    ensure!(
        failures
            .iter()
            .all(|kind| *kind == Some(ErrorKind::InvalidTransition))
    );
    let trail = workflow
        .task_validation
        .list_task_validations(task.id())
        .await?;
    ensure!(trail.len() == 1);
    Ok(())
}
