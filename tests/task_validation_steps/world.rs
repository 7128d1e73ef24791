//! Shared world state for task validation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use crate::test_helpers::Workflow;
use rstest::fixture;
use uatflow::workflow::{
    adapters::memory::InMemoryWorkflowRepository,
    domain::{BugReport, ReadinessReport, TaskId, UatTask},
    services::WorkflowServiceError,
};

/// Scenario world for task validation behaviour tests.
pub struct ValidationWorld {
    pub workflow: Workflow<InMemoryWorkflowRepository>,
    pub task: Option<UatTask>,
    pub bugs: HashMap<String, BugReport>,
    pub latest_bug: Option<BugReport>,
    pub readiness: Option<ReadinessReport>,
    pub can_complete: Option<bool>,
    pub last_error: Option<WorkflowServiceError>,
}

impl ValidationWorld {
    /// Creates a world backed by an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workflow: Workflow::new(Arc::new(InMemoryWorkflowRepository::new())),
            task: None,
            bugs: HashMap::new(),
            latest_bug: None,
            readiness: None,
            can_complete: None,
            last_error: None,
        }
    }

    /// Returns the identifier of the scenario's task.
    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .as_ref()
            .map(UatTask::id)
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Looks up a bug filed earlier in the scenario by its description.
    pub fn bug(&self, description: &str) -> Result<&BugReport, eyre::Report> {
        self.bugs
            .get(description)
            .ok_or_else(|| eyre::eyre!("no bug filed as \"{description}\""))
    }

    /// Remembers a filed bug under its description.
    pub fn remember_bug(&mut self, bug: BugReport) {
        self.bugs.insert(bug.description().to_owned(), bug.clone());
        self.latest_bug = Some(bug);
    }

    /// Records the outcome of a `when` step, keeping the error for `then`
    /// steps to inspect.
    pub fn record<T>(&mut self, result: Result<T, WorkflowServiceError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }
}

impl Default for ValidationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ValidationWorld {
    ValidationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
