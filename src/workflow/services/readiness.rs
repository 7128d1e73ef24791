//! Task readiness evaluation.

use super::{WorkflowServiceResult, dispatch::require_snapshot};
use crate::workflow::{
    domain::{ReadinessReport, TaskId},
    ports::WorkflowRepository,
};
use std::sync::Arc;

/// Read-only evaluator of whether QA may validate a task.
///
/// Readiness is recomputed from a consistent snapshot on every call and is
/// never cached.
#[derive(Clone)]
pub struct TaskReadinessService<R>
where
    R: WorkflowRepository,
{
    repository: Arc<R>,
}

impl<R> TaskReadinessService<R>
where
    R: WorkflowRepository,
{
    /// Creates a new readiness service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Computes readiness over the task's current bug reports.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the task does not exist.
    pub async fn check_readiness(&self, task_id: TaskId) -> WorkflowServiceResult<ReadinessReport> {
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        let report = snapshot.readiness();
        tracing::debug!(
            task_id = %task_id,
            ready = report.is_ready(),
            total = report.total_bug_reports(),
            validated = report.validated_bug_reports(),
            "readiness evaluated"
        );
        Ok(report)
    }
}
