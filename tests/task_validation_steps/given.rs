//! Given steps for task validation BDD scenarios.

use super::world::{ValidationWorld, run_async};
use crate::test_helpers::bug_draft;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use uatflow::workflow::domain::{BugValidationStatus, TaskValidationOutcome};

#[given("a worker has started a UAT task")]
fn started_task(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task = run_async(world.workflow.started_task()).wrap_err("start scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"the worker filed a bug report "{description}""#)]
fn filed_bug(world: &mut ValidationWorld, description: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let bug = run_async(world.workflow.file_bug(task_id, &description))
        .wrap_err("file scenario bug")?;
    world.remember_bug(bug);
    Ok(())
}

#[given("the worker completed the task")]
fn completed_task(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let task = run_async(
        world
            .workflow
            .execution
            .complete_task(world.workflow.worker, task_id),
    )
    .wrap_err("complete scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"QA validated bug "{description}" as "{status}""#)]
fn validated_bug(
    world: &mut ValidationWorld,
    description: String,
    status: String,
) -> Result<(), eyre::Report> {
    let determination = BugValidationStatus::try_from(status.as_str())?;
    let bug_id = world.bug(&description)?.id();
    run_async(world.workflow.judge_bug(bug_id, determination)).wrap_err("validate scenario bug")?;
    Ok(())
}

#[given(r#"QA requested a revision with comments "{comments}""#)]
fn requested_revision(world: &mut ValidationWorld, comments: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let applied = run_async(world.workflow.decide(
        task_id,
        TaskValidationOutcome::NeedRevision,
        &comments,
    ))
    .wrap_err("request scenario revision")?;
    world.task = Some(applied.task);
    Ok(())
}

#[given("the worker started the revision")]
fn started_revision(world: &mut ValidationWorld) -> Result<(), eyre::Report> {
    let task_id = world.task_id()?;
    let task = run_async(
        world
            .workflow
            .revision
            .start_revision(world.workflow.worker, task_id),
    )
    .wrap_err("start scenario revision")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"the worker filed a revision of bug "{original}" as "{description}""#)]
fn filed_revision(
    world: &mut ValidationWorld,
    original: String,
    description: String,
) -> Result<(), eyre::Report> {
    let original_id = world.bug(&original)?.id();
    let revision = run_async(world.workflow.bugs.create_bug_revision(
        world.workflow.worker,
        original_id,
        bug_draft(&description)?,
    ))
    .wrap_err("file scenario bug revision")?;
    world.remember_bug(revision);
    Ok(())
}
