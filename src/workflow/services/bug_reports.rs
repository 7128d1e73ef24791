//! Bug report registry: filing, revising, and chain lookups.

use super::{
    WorkflowServiceError, WorkflowServiceResult,
    dispatch::{dispatch, require_bug_report, require_snapshot},
};
use crate::workflow::{
    domain::{
        BugReport, BugReportDraft, BugReportId, Caller, TaskAction, TaskId, WorkflowCommand,
    },
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Bug report registry service.
#[derive(Clone)]
pub struct BugReportService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> BugReportService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new bug report service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Files a first-time bug report against a task.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside an active task or active revision
    /// cycle and `Unauthorized` unless the caller is the assigned worker.
    pub async fn create_bug_report(
        &self,
        caller: Caller,
        task_id: TaskId,
        draft: BugReportDraft,
    ) -> WorkflowServiceResult<BugReport> {
        let command = WorkflowCommand::FileBugReport { caller, draft };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        change_set
            .bug_report()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::FileBugReport))
    }

    /// Files a revision superseding a bug QA flagged as needing more
    /// information.
    ///
    /// The revision inherits the original's task and is numbered one past
    /// the highest revision in its chain.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the original does not exist and
    /// `BugNotRevisable` when it is unvalidated, finally determined, or
    /// already superseded.
    pub async fn create_bug_revision(
        &self,
        caller: Caller,
        original_bug_id: BugReportId,
        draft: BugReportDraft,
    ) -> WorkflowServiceResult<BugReport> {
        let original = require_bug_report(&*self.repository, original_bug_id).await?;
        let command = WorkflowCommand::ReviseBugReport {
            caller,
            original_bug_id,
            draft,
        };
        let change_set = dispatch(
            &*self.repository,
            original.task_id(),
            command,
            self.clock.utc(),
        )
        .await?;
        change_set
            .bug_report()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::FileBugReport))
    }

    /// Retrieves a bug report by identifier.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn find_bug_report(
        &self,
        bug_id: BugReportId,
    ) -> WorkflowServiceResult<Option<BugReport>> {
        Ok(self.repository.find_bug_report(bug_id).await?)
    }

    /// Lists every bug report of a task, including superseded ones.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn list_bug_reports(&self, task_id: TaskId) -> WorkflowServiceResult<Vec<BugReport>> {
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        Ok(snapshot.bug_reports().to_vec())
    }

    /// Lists the latest revision of every chain of a task.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn list_current_bug_reports(
        &self,
        task_id: TaskId,
    ) -> WorkflowServiceResult<Vec<BugReport>> {
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        Ok(snapshot
            .current_bug_reports()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Walks the revision chain from `bug_id` back to its first filing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the bug does not exist and
    /// `CorruptRevisionChain` when the stored chain is broken or cyclic.
    pub async fn revision_chain(&self, bug_id: BugReportId) -> WorkflowServiceResult<Vec<BugReport>> {
        let bug = require_bug_report(&*self.repository, bug_id).await?;
        let snapshot = require_snapshot(&*self.repository, bug.task_id()).await?;
        let chain = snapshot.revision_chain(bug_id)?;
        tracing::debug!(bug_id = %bug_id, length = chain.len(), "revision chain resolved");
        Ok(chain.into_iter().cloned().collect())
    }
}
