//! Constraint-backed duplicate detection under concurrent access.

use std::sync::Arc;

use crate::postgres::helpers::{PreparedWorkflow, prepare, test_runtime};
use eyre::{Result, ensure};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use tokio::task::JoinSet;
use uatflow::workflow::{
    domain::{BugValidationStatus, ErrorKind, TaskValidationOutcome},
    ports::{WorkflowRepository, WorkflowRepositoryError},
    services::{ValidateBugRequest, WorkflowServiceError},
};

#[rstest]
fn concurrent_bug_validations_store_exactly_one_row(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "bug_race")?;
    test_runtime()?.block_on(race_bug_validations(&prepared))
}

#[rstest]
fn storing_a_task_twice_is_a_duplicate(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "dup_task")?;
    test_runtime()?.block_on(store_task_twice(&prepared))
}

#[rstest]
fn decided_task_rejects_second_decision(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "second_decision")?;
    test_runtime()?.block_on(decide_twice(&prepared))
}

#[rstest]
fn concurrent_task_decisions_record_one_trail_entry(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let prepared = prepare(shared_test_cluster, "decision_race")?;
    test_runtime()?.block_on(race_task_decisions(&prepared))
}

async fn race_bug_validations(prepared: &PreparedWorkflow) -> Result<()> {
    let workflow = Arc::clone(&prepared.workflow);
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "dashboard shows stale totals").await?;

    let mut racers = JoinSet::new();
    for attempt in 0..6 {
        let shared = Arc::clone(&workflow);
        let bug_id = bug.id();
        racers.spawn(async move {
            let request = ValidateBugRequest::new(
                bug_id,
                BugValidationStatus::Valid,
                format!("attempt {attempt}"),
            );
            shared.bug_validation.validate(shared.qa, request).await
        });
    }
    let results: Vec<Result<_, WorkflowServiceError>> = racers.join_all().await;

    let winners = results.iter().filter(|result| result.is_ok()).count();
    ensure!(winners == 1, "expected one winner, got {winners}");
    ensure!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| err.kind() == Some(ErrorKind::AlreadyValidated))
    );

    let snapshot = prepared
        .repository
        .load_snapshot(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task should be persisted"))?;
    ensure!(snapshot.bug_validations().len() == 1);
    Ok(())
}

async fn store_task_twice(prepared: &PreparedWorkflow) -> Result<()> {
    let task = prepared.workflow.started_task().await?;

    let result = prepared.repository.store_task(&task).await;
    ensure!(
        matches!(result, Err(WorkflowRepositoryError::DuplicateTask(id)) if id == task.id()),
        "expected DuplicateTask, got {result:?}"
    );
    Ok(())
}

async fn decide_twice(prepared: &PreparedWorkflow) -> Result<()> {
    let workflow = &prepared.workflow;
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "dashboard shows stale totals").await?;
    workflow
        .execution
        .complete_task(workflow.worker, task.id())
        .await?;
    workflow
        .judge_bug(bug.id(), BugValidationStatus::Invalid)
        .await?;
    workflow
        .decide(task.id(), TaskValidationOutcome::Rejected, "")
        .await?;

    let again = workflow
        .decide(task.id(), TaskValidationOutcome::PassVerified, "")
        .await;
    let kind = again
        .as_ref()
        .err()
        .and_then(|err| err.downcast_ref::<WorkflowServiceError>())
        .and_then(WorkflowServiceError::kind);
    ensure!(kind == Some(ErrorKind::InvalidTransition));
    Ok(())
}

async fn race_task_decisions(prepared: &PreparedWorkflow) -> Result<()> {
    let workflow = Arc::clone(&prepared.workflow);
    let task = workflow.started_task().await?;
    let bug = workflow.file_bug(task.id(), "filters reset on refresh").await?;
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
        racers.spawn(async move { shared.decide(task_id, outcome, "").await });
    }
    let results = racers.join_all().await;

    let winners = results.iter().filter(|result| result.is_ok()).count();
    ensure!(winners == 1, "expected one winner, got {winners}");
    ensure!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .filter_map(|err| err.downcast_ref::<WorkflowServiceError>())
            .all(|err| err.kind() == Some(ErrorKind::InvalidTransition)),
        "losers must see the decided task"
    );

    let trail = workflow
        .task_validation
        .list_task_validations(task.id())
        .await?;
    ensure!(trail.len() == 1, "expected one trail entry, got {}", trail.len());
    Ok(())
}
