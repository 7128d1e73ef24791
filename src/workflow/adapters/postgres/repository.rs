//! `PostgreSQL` repository implementation for workflow storage.

use super::{
    conversion::{
        bug_report_to_row, bug_validation_to_row, evidence_to_row, row_to_bug_report,
        row_to_bug_validation, row_to_evidence, row_to_task, row_to_task_validation,
        task_to_row, task_validation_to_row,
    },
    models::{BugReportRow, BugValidationRow, EvidenceRow, TaskRow, TaskValidationRow},
    schema::{bug_reports, bug_validations, task_validations, test_evidence, uat_tasks},
};
use crate::config::DatabaseConfig;
use crate::workflow::{
    domain::{
        BugReport, BugReportId, EvidenceId, RecordWrite, TaskChangeSet, TaskId, TaskSnapshot,
        TestEvidence, UatTask, WorkflowCommand,
    },
    ports::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::time::Duration;
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by the workflow adapter.
pub type WorkflowPgPool = Pool<ConnectionManager<PgConnection>>;

const BUG_VALIDATION_UNIQUE: &str = "uq_bug_validations_bug_report";
const TASK_VALIDATION_UNIQUE: &str = "uq_task_validations_cycle";

/// `PostgreSQL`-backed workflow repository.
///
/// `execute` runs in one transaction that first locks the task row with
/// `SELECT … FOR UPDATE`, so commands on the same task serialize while
/// commands on different tasks proceed in parallel. Unique constraints on
/// validations back the planner's duplicate checks.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowRepository {
    pool: WorkflowPgPool,
}

impl PostgresWorkflowRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRepositoryError::Persistence`] when the pool cannot
    /// establish its initial connections.
    pub fn connect(config: &DatabaseConfig) -> WorkflowRepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)
            .map_err(WorkflowRepositoryError::persistence)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &WorkflowPgPool {
        &self.pool
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkflowRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkflowRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkflowRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkflowRepositoryError::persistence)?
    }
}

impl From<DieselError> for WorkflowRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn store_task(&self, task: &UatTask) -> WorkflowRepositoryResult<()> {
        let task_id = task.id();
        let row = task_to_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(uat_tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkflowRepositoryError::DuplicateTask(task_id)
                    }
                    _ => WorkflowRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> WorkflowRepositoryResult<Option<UatTask>> {
        self.run_blocking(move |connection| {
            let row = uat_tasks::table
                .filter(uat_tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn load_snapshot(&self, id: TaskId) -> WorkflowRepositoryResult<Option<TaskSnapshot>> {
        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run::<_, WorkflowRepositoryError, _>(|tx| {
                    let Some(row) = find_task_row(tx, id, RowLock::Unlocked)? else {
                        return Ok(None);
                    };
                    load_owned_records(tx, row).map(Some)
                })
        })
        .await
    }

    async fn find_bug_report(
        &self,
        id: BugReportId,
    ) -> WorkflowRepositoryResult<Option<BugReport>> {
        self.run_blocking(move |connection| {
            let row = bug_reports::table
                .filter(bug_reports::id.eq(id.into_inner()))
                .select(BugReportRow::as_select())
                .first::<BugReportRow>(connection)
                .optional()?;
            row.map(row_to_bug_report).transpose()
        })
        .await
    }

    async fn find_evidence(&self, id: EvidenceId) -> WorkflowRepositoryResult<Option<TestEvidence>> {
        self.run_blocking(move |connection| {
            let row = test_evidence::table
                .filter(test_evidence::id.eq(id.into_inner()))
                .select(EvidenceRow::as_select())
                .first::<EvidenceRow>(connection)
                .optional()?;
            row.map(row_to_evidence).transpose()
        })
        .await
    }

    async fn execute(
        &self,
        task_id: TaskId,
        command: WorkflowCommand,
        issued_at: DateTime<Utc>,
    ) -> WorkflowRepositoryResult<TaskChangeSet> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkflowRepositoryError, _>(|tx| {
                let row = find_task_row(tx, task_id, RowLock::ForUpdate)?
                    .ok_or(WorkflowRepositoryError::TaskNotFound(task_id))?;
                let snapshot = load_owned_records(tx, row)?;
                let change_set = command.plan(&snapshot, issued_at)?;
                apply_change_set(tx, &change_set)?;
                Ok(change_set)
            })
        })
        .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowLock {
    Unlocked,
    ForUpdate,
}

fn find_task_row(
    connection: &mut PgConnection,
    id: TaskId,
    lock: RowLock,
) -> WorkflowRepositoryResult<Option<TaskRow>> {
    let query = uat_tasks::table
        .filter(uat_tasks::id.eq(id.into_inner()))
        .select(TaskRow::as_select());
    let row = match lock {
        RowLock::Unlocked => query.first::<TaskRow>(connection).optional()?,
        RowLock::ForUpdate => query.for_update().first::<TaskRow>(connection).optional()?,
    };
    Ok(row)
}

fn load_owned_records(
    connection: &mut PgConnection,
    task_row: TaskRow,
) -> WorkflowRepositoryResult<TaskSnapshot> {
    let task_uuid = task_row.id;
    let task = row_to_task(task_row)?;

    let bug_rows = bug_reports::table
        .filter(bug_reports::task_id.eq(task_uuid))
        .order((bug_reports::created_at.asc(), bug_reports::revision_number.asc()))
        .select(BugReportRow::as_select())
        .load::<BugReportRow>(connection)?;
    let bug_ids: Vec<Uuid> = bug_rows.iter().map(|row| row.id).collect();

    let validation_rows = bug_validations::table
        .filter(bug_validations::bug_report_id.eq_any(&bug_ids))
        .select(BugValidationRow::as_select())
        .load::<BugValidationRow>(connection)?;

    let evidence_rows = test_evidence::table
        .filter(
            test_evidence::task_id
                .eq(task_uuid)
                .or(test_evidence::bug_report_id.eq_any(&bug_ids)),
        )
        .order((test_evidence::step_number.asc(), test_evidence::created_at.asc()))
        .select(EvidenceRow::as_select())
        .load::<EvidenceRow>(connection)?;

    let task_validation_rows = task_validations::table
        .filter(task_validations::task_id.eq(task_uuid))
        .order(task_validations::revision_cycle.asc())
        .select(TaskValidationRow::as_select())
        .load::<TaskValidationRow>(connection)?;

    Ok(TaskSnapshot::from_parts(
        task,
        bug_rows
            .into_iter()
            .map(row_to_bug_report)
            .collect::<WorkflowRepositoryResult<_>>()?,
        validation_rows
            .into_iter()
            .map(row_to_bug_validation)
            .collect::<WorkflowRepositoryResult<_>>()?,
        evidence_rows
            .into_iter()
            .map(row_to_evidence)
            .collect::<WorkflowRepositoryResult<_>>()?,
        task_validation_rows
            .into_iter()
            .map(row_to_task_validation)
            .collect::<WorkflowRepositoryResult<_>>()?,
    ))
}

fn apply_change_set(
    connection: &mut PgConnection,
    change_set: &TaskChangeSet,
) -> WorkflowRepositoryResult<()> {
    match change_set.record() {
        Some(RecordWrite::InsertBugReport(bug)) => {
            diesel::insert_into(bug_reports::table)
                .values(&bug_report_to_row(bug)?)
                .execute(connection)?;
        }
        Some(RecordWrite::InsertBugValidation(validation)) => {
            diesel::insert_into(bug_validations::table)
                .values(&bug_validation_to_row(validation))
                .execute(connection)
                .map_err(|err| {
                    map_unique_violation(err, BUG_VALIDATION_UNIQUE, || {
                        WorkflowRepositoryError::DuplicateBugValidation(validation.bug_report_id())
                    })
                })?;
        }
        Some(RecordWrite::InsertTaskValidation(validation)) => {
            diesel::insert_into(task_validations::table)
                .values(&task_validation_to_row(validation)?)
                .execute(connection)
                .map_err(|err| {
                    map_unique_violation(err, TASK_VALIDATION_UNIQUE, || {
                        WorkflowRepositoryError::DuplicateTaskValidation {
                            task_id: validation.task_id(),
                            revision_cycle: validation.revision_cycle(),
                        }
                    })
                })?;
        }
        Some(RecordWrite::InsertEvidence(item)) => {
            diesel::insert_into(test_evidence::table)
                .values(&evidence_to_row(item)?)
                .execute(connection)?;
        }
        Some(RecordWrite::UpdateEvidence(item)) => {
            diesel::update(test_evidence::table.find(item.id().into_inner()))
                .set(&evidence_to_row(item)?)
                .execute(connection)?;
        }
        Some(RecordWrite::DeleteEvidence(id)) => {
            diesel::delete(test_evidence::table.find(id.into_inner())).execute(connection)?;
        }
        None => {}
    }

    if change_set.task_changed() {
        let task = change_set.task();
        diesel::update(uat_tasks::table.find(task.id().into_inner()))
            .set(&task_to_row(task)?)
            .execute(connection)?;
    }
    Ok(())
}

fn map_unique_violation(
    err: DieselError,
    constraint: &str,
    duplicate: impl FnOnce() -> WorkflowRepositoryError,
) -> WorkflowRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
            if is_constraint(info.as_ref(), constraint) =>
        {
            duplicate()
        }
        _ => WorkflowRepositoryError::persistence(err),
    }
}

fn is_constraint(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}
