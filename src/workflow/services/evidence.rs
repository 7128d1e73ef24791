//! Evidence store: screenshots and notes attached to tasks or bug reports.

use super::{
    WorkflowServiceError, WorkflowServiceResult,
    dispatch::{dispatch, owning_task, require_snapshot},
};
use crate::workflow::{
    domain::{
        Caller, EntityRef, EvidenceDraft, EvidenceId, EvidenceOwner, TaskAction, TaskId,
        TestEvidence, WorkflowCommand, WorkflowError,
    },
    ports::WorkflowRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Evidence store service.
///
/// New evidence may be attached while the task is active or in an active
/// revision cycle. Existing evidence is editable only while the task is
/// `in_progress`.
#[derive(Clone)]
pub struct EvidenceService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> EvidenceService<R, C>
where
    R: WorkflowRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new evidence service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Attaches evidence to a task or one of its bug reports.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the owner does not exist, `InvalidTransition`
    /// when the task is not accepting artifacts, and `Unauthorized` unless
    /// the caller is the assigned worker.
    pub async fn put_evidence(
        &self,
        caller: Caller,
        owner: EvidenceOwner,
        draft: EvidenceDraft,
    ) -> WorkflowServiceResult<TestEvidence> {
        let task_id = owning_task(&*self.repository, owner).await?;
        let command = WorkflowCommand::AttachEvidence {
            caller,
            owner,
            draft,
        };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        change_set
            .evidence()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::AttachEvidence))
    }

    /// Lists evidence attached to `owner`, ordered by step number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the owner does not exist.
    pub async fn list_evidence(
        &self,
        owner: EvidenceOwner,
    ) -> WorkflowServiceResult<Vec<TestEvidence>> {
        let task_id = owning_task(&*self.repository, owner).await?;
        let snapshot = require_snapshot(&*self.repository, task_id).await?;
        Ok(snapshot
            .evidence_for(owner)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Replaces the content of an evidence item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the item does not exist and
    /// `InvalidTransition` once the task has left `in_progress`.
    pub async fn update_evidence(
        &self,
        caller: Caller,
        evidence_id: EvidenceId,
        draft: EvidenceDraft,
    ) -> WorkflowServiceResult<TestEvidence> {
        let task_id = self.evidence_task(evidence_id).await?;
        let command = WorkflowCommand::ReviseEvidence {
            caller,
            evidence_id,
            draft,
        };
        let change_set = dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        change_set
            .evidence()
            .cloned()
            .ok_or(WorkflowServiceError::MissingRecord(TaskAction::EditEvidence))
    }

    /// Deletes an evidence item.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the item does not exist and
    /// `InvalidTransition` once the task has left `in_progress`.
    pub async fn delete_evidence(
        &self,
        caller: Caller,
        evidence_id: EvidenceId,
    ) -> WorkflowServiceResult<()> {
        let task_id = self.evidence_task(evidence_id).await?;
        let command = WorkflowCommand::RemoveEvidence {
            caller,
            evidence_id,
        };
        dispatch(&*self.repository, task_id, command, self.clock.utc()).await?;
        Ok(())
    }

    async fn evidence_task(
        &self,
        evidence_id: EvidenceId,
    ) -> WorkflowServiceResult<TaskId> {
        let item = self
            .repository
            .find_evidence(evidence_id)
            .await?
            .ok_or(WorkflowError::NotFound(EntityRef::Evidence(evidence_id)))?;
        owning_task(&*self.repository, item.owner()).await
    }
}
