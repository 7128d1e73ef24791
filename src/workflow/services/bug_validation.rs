//! QA determinations on individual bug reports.

use super::{
    WorkflowServiceError, WorkflowServiceResult,
    dispatch::{dispatch, require_bug_report, require_snapshot},
};
use crate::workflow::{
    domain::{
        BugReportId, BugValidation, BugValidationStatus, Caller, TaskAction, WorkflowCommand,
    },
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for validating a bug report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateBugRequest {
    bug_report_id: BugReportId,
    status: BugValidationStatus,
    comments: String,
}

impl ValidateBugRequest {
    /// Creates a request; `comments` must not be blank.
    #[must_use]
    pub fn new(
        bug_report_id: BugReportId,
        status: BugValidationStatus,
        comments: impl Into<String>,
    ) -> Self {
        Self {
            bug_report_id,
            status,
            comments: comments.into(),
        }
    }
}

/// Bug validation service.
///
/// Each bug report receives exactly one determination. Bug and task
/// validation are independent; validating the last open bug never advances
/// the task.
#[derive(Clone)]
pub struct BugValidationService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> BugValidationService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new bug validation service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Records the QA determination on a bug report.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the bug does not exist, `AlreadyValidated`
    /// when a determination exists (including a concurrent one that won the
    /// race), `CommentsRequired` for blank comments, `Unauthorized` unless
    /// the caller is a QA specialist, and `InvalidTransition` once the task
    /// is terminal.
    pub async fn validate(
        &self,
        caller: Caller,
        request: ValidateBugRequest,
    ) -> WorkflowServiceResult<BugValidation> {
        let ValidateBugRequest {
            bug_report_id,
            status,
            comments,
        } = request;
        let bug = require_bug_report(&*self.repository, bug_report_id).await?;
        let command = WorkflowCommand::ValidateBug {
            caller,
            bug_report_id,
            status,
            comments,
        };
        let change_set =
            dispatch(&*self.repository, bug.task_id(), command, self.clock.utc()).await?;
        change_set
            .bug_validation()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::ValidateBug))
    }

    /// Returns the determination recorded for a bug report, if any.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the bug does not exist.
    pub async fn validation_for(
        &self,
        bug_report_id: BugReportId,
    ) -> WorkflowServiceResult<Option<BugValidation>> {
        let bug = require_bug_report(&*self.repository, bug_report_id).await?;
        let snapshot = require_snapshot(&*self.repository, bug.task_id()).await?;
        Ok(snapshot.validation_for(bug_report_id).cloned())
    }
}
