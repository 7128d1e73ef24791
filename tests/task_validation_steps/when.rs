//! When steps for task validation BDD scenarios.

use super::world::{ValidationWorld, run_async};
use crate::test_helpers::bug_draft;
use rstest_bdd_macros::when;
use uatflow::workflow::{
    domain::{BugValidationStatus, TaskValidationOutcome},
    services::{TaskValidationRequest, ValidateBugRequest},
};

#[when("the worker tries to complete the task")]
fn try_complete(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    world.can_complete = Some(run_async(world.workflow.execution.can_complete(task_id))?);
    let result = run_async(
        world
            .workflow
            .execution
            .complete_task(world.workflow.worker, task_id),
    );
    if let Some(task) = world.record(result) {
        world.task = Some(task);
    }
    Ok(())
}

#[when("the worker completes the task")]
fn complete(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    try_complete(world)?;
    if let Some(err) = world.last_error.take() {
        return Err(eyre::eyre!("completion should succeed, got {err}"));
    }
    Ok(())
}

#[when("QA checks readiness")]
fn check_readiness(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let report = run_async(world.workflow.readiness.check_readiness(task_id))?;
    world.readiness = Some(report);
    Ok(())
}

fn apply(world: &mut ValidationWorld, outcome: &str, comments: &str) -> Result<(), eyre::Report> {
    let decision = TaskValidationOutcome::try_from(outcome)?;
    let task_id = world.task_id()?;
    let request = TaskValidationRequest::new(task_id, decision).with_comments(comments);
    let result = run_async(
        world
            .workflow
            .task_validation
            .apply_task_validation(world.workflow.qa, request),
    );
    if let Some(applied) = world.record(result) {
        world.task = Some(applied.task);
    }
    Ok(())
}

#[when(r#"QA applies "{outcome}" with comments "{comments}""#)]
fn apply_with_comments(
    world: &mut ValidationWorld,
    outcome: String,
    comments: String,
) -> Result<(), eyre::Report> {
    apply(world, &outcome, &comments)
}

#[when(r#"QA applies "{outcome}" without comments"#)]
fn apply_without_comments(world: &mut ValidationWorld, outcome: String) -> Result<(), eyre::Report> {
    apply(world, &outcome, "")
}

#[when("the worker starts the revision")]
fn start_revision(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let result = run_async(
        world
            .workflow
            .revision
            .start_revision(world.workflow.worker, task_id),
    );
    if let Some(task) = world.record(result) {
        world.task = Some(task);
    }
    Ok(())
}

#[when(r#"the worker revises bug "{original}" as "{description}""#)]
fn revise_bug(
    world: &mut ValidationWorld,
    original: String,
    description: String,
) -> Result<(), eyre::Report> {
    let original_id = world.bug(&original)?.id();
    let result = run_async(world.workflow.bugs.create_bug_revision(
        world.workflow.worker,
        original_id,
        bug_draft(&description)?,
    ));
    if let Some(revision) = world.record(result) {
        world.remember_bug(revision);
    }
    Ok(())
}

#[when(r#"QA validates bug "{description}" as "{status}""#)]
fn validate_bug(
    world: &mut ValidationWorld,
    description: String,
    status: String,
) -> Result<(), eyre::Report> {
    let determination = BugValidationStatus::try_from(status.as_str())?;
    let bug_id = world.bug(&description)?.id();
    let request = ValidateBugRequest::new(bug_id, determination, "second look");
    let result = run_async(
        world
            .workflow
            .bug_validation
            .validate(world.workflow.qa, request),
    );
    world.record(result);
    Ok(())
}
