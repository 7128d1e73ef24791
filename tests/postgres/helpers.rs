//! Shared helpers for `PostgreSQL` workflow integration tests.
//!
//! Each test gets its own database cloned from a template that carries the
//! workflow schema, so tests never observe each other's rows.

use std::sync::Arc;

use crate::test_helpers::Workflow;
use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use eyre::{Result, WrapErr};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use uatflow::config::DatabaseConfig;
use uatflow::workflow::adapters::postgres::PostgresWorkflowRepository;
use uuid::Uuid;

/// SQL creating the workflow schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_uat_workflow_tables/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "uatflow_test_template";

pub type PgWorkflow = Workflow<PostgresWorkflowRepository>;

/// Creates a multi-threaded runtime so racing commands hold separate
/// pooled connections.
pub fn test_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .wrap_err("build test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut connection =
                PgConnection::establish(&url).map_err(|err| eyre::eyre!("{err}"))?;
            connection
                .batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|err| eyre::eyre!("apply workflow schema: {err}"))?;
            Ok(())
        })
        .map_err(|err| eyre::eyre!("template setup failed: {err}"))
}

/// Test database dropped when the guard goes out of scope.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
}

impl TestDatabase {
    fn create(cluster: &'static TestCluster, label: &str) -> Result<Self> {
        let name = format!("test_{label}_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|err| eyre::eyre!("create database {name}: {err}"))?;
        Ok(Self { cluster, name })
    }

    fn url(&self) -> String {
        self.cluster.connection().database_url(&self.name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.name.as_str()) {
            tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
        }
    }
}

/// Services, repository, and the database they run against.
///
/// Fields drop in declaration order, so the pool closes before the database
/// is dropped.
pub struct PreparedWorkflow {
    /// Repository backing the services.
    pub repository: Arc<PostgresWorkflowRepository>,
    /// Services wired to `repository`.
    pub workflow: Arc<PgWorkflow>,
    /// Database owned by this test.
    pub database: TestDatabase,
}

/// Creates a database from the template and wires the services to it.
///
/// # Errors
///
/// Returns an error if template creation, database creation, or pool setup
/// fails.
pub fn prepare(cluster: &'static TestCluster, label: &str) -> Result<PreparedWorkflow> {
    ensure_template(cluster)?;
    let database = TestDatabase::create(cluster, label)?;
    let config = DatabaseConfig {
        url: database.url(),
        max_connections: 8,
        connection_timeout_secs: 10,
    };
    let repository = Arc::new(
        PostgresWorkflowRepository::connect(&config).wrap_err("connect test repository")?,
    );
    let workflow = Arc::new(Workflow::new(Arc::clone(&repository)));
    Ok(PreparedWorkflow {
        repository,
        workflow,
        database,
    })
}
