//! In-memory workflow repository.
//!
//! A single `RwLock` guards all records, so holding the write guard across
//! load, plan, and commit serializes every command.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::workflow::{
    domain::{
        BugReport, BugReportId, BugValidation, EvidenceId, EvidenceOwner, RecordWrite,
        TaskChangeSet, TaskId, TaskSnapshot, TaskValidation, TestEvidence, UatTask,
        WorkflowCommand,
    },
    ports::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult},
};

/// Thread-safe in-memory workflow repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRepository {
    state: Arc<RwLock<InMemoryWorkflowState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkflowState {
    tasks: HashMap<TaskId, UatTask>,
    bug_reports: HashMap<BugReportId, BugReport>,
    bug_validations: HashMap<BugReportId, BugValidation>,
    task_validations: Vec<TaskValidation>,
    evidence: HashMap<EvidenceId, TestEvidence>,
}

impl InMemoryWorkflowRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: &PoisonError<T>) -> WorkflowRepositoryError {
    WorkflowRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryWorkflowState {
    fn snapshot(&self, task_id: TaskId) -> Option<TaskSnapshot> {
        let task = self.tasks.get(&task_id)?.clone();

        let mut bug_reports: Vec<BugReport> = self
            .bug_reports
            .values()
            .filter(|bug| bug.task_id() == task_id)
            .cloned()
            .collect();
        bug_reports.sort_by_key(|bug| (bug.created_at(), bug.revision_number()));

        let bug_validations = bug_reports
            .iter()
            .filter_map(|bug| self.bug_validations.get(&bug.id()).cloned())
            .collect();

        let evidence = self
            .evidence
            .values()
            .filter(|item| match item.owner() {
                EvidenceOwner::Task(owner) => owner == task_id,
                EvidenceOwner::BugReport(bug_id) => self
                    .bug_reports
                    .get(&bug_id)
                    .is_some_and(|bug| bug.task_id() == task_id),
            })
            .cloned()
            .collect();

        let mut task_validations: Vec<TaskValidation> = self
            .task_validations
            .iter()
            .filter(|validation| validation.task_id() == task_id)
            .cloned()
            .collect();
        task_validations.sort_by_key(TaskValidation::revision_cycle);

        Some(TaskSnapshot::from_parts(
            task,
            bug_reports,
            bug_validations,
            evidence,
            task_validations,
        ))
    }

    fn apply(&mut self, change_set: &TaskChangeSet) -> WorkflowRepositoryResult<()> {
        match change_set.record() {
            Some(RecordWrite::InsertBugValidation(validation))
                if self
                    .bug_validations
                    .contains_key(&validation.bug_report_id()) =>
            {
                return Err(WorkflowRepositoryError::DuplicateBugValidation(
                    validation.bug_report_id(),
                ));
            }
            Some(RecordWrite::InsertTaskValidation(validation))
                if self.task_validations.iter().any(|existing| {
                    existing.task_id() == validation.task_id()
                        && existing.revision_cycle() == validation.revision_cycle()
                }) =>
            {
                return Err(WorkflowRepositoryError::DuplicateTaskValidation {
                    task_id: validation.task_id(),
                    revision_cycle: validation.revision_cycle(),
                });
            }
            _ => {}
        }

        match change_set.record() {
            Some(RecordWrite::InsertBugReport(bug)) => {
                self.bug_reports.insert(bug.id(), bug.clone());
            }
            Some(RecordWrite::InsertBugValidation(validation)) => {
                self.bug_validations
                    .insert(validation.bug_report_id(), validation.clone());
            }
            Some(RecordWrite::InsertTaskValidation(validation)) => {
                self.task_validations.push(validation.clone());
            }
            Some(RecordWrite::InsertEvidence(item) | RecordWrite::UpdateEvidence(item)) => {
                self.evidence.insert(item.id(), item.clone());
            }
            Some(RecordWrite::DeleteEvidence(id)) => {
                self.evidence.remove(id);
            }
            None => {}
        }

        if change_set.task_changed() {
            let task = change_set.task();
            self.tasks.insert(task.id(), task.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn store_task(&self, task: &UatTask) -> WorkflowRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        if state.tasks.contains_key(&task.id()) {
            return Err(WorkflowRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> WorkflowRepositoryResult<Option<UatTask>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn load_snapshot(&self, id: TaskId) -> WorkflowRepositoryResult<Option<TaskSnapshot>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.snapshot(id))
    }

    async fn find_bug_report(
        &self,
        id: BugReportId,
    ) -> WorkflowRepositoryResult<Option<BugReport>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.bug_reports.get(&id).cloned())
    }

    async fn find_evidence(&self, id: EvidenceId) -> WorkflowRepositoryResult<Option<TestEvidence>> {
        let state = self.state.read().map_err(|err| poisoned(&err))?;
        Ok(state.evidence.get(&id).cloned())
    }

    async fn execute(
        &self,
        task_id: TaskId,
        command: WorkflowCommand,
        issued_at: DateTime<Utc>,
    ) -> WorkflowRepositoryResult<TaskChangeSet> {
        let mut state = self.state.write().map_err(|err| poisoned(&err))?;
        let snapshot = state
            .snapshot(task_id)
            .ok_or(WorkflowRepositoryError::TaskNotFound(task_id))?;
        let change_set = command.plan(&snapshot, issued_at)?;
        state.apply(&change_set)?;
        Ok(change_set)
    }
}
