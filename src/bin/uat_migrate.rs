//! Applies or reverts the UAT workflow schema.
//!
//! Usage:
//!
//! ```text
//! uat_migrate <up|down> [config-path]
//! ```
//!
//! `config-path` defaults to `uatflow.toml`; a missing file falls back to the
//! built-in defaults. `UATFLOW_DATABASE_URL` overrides the configured
//! database URL. Log verbosity follows `RUST_LOG` (default `info`).

use diesel::Connection;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use uatflow::config::{ConfigError, EngineConfig};

const DEFAULT_CONFIG_PATH: &str = "uatflow.toml";
const UP_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_uat_workflow_tables/up.sql");
const DOWN_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_uat_workflow_tables/down.sql");

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum MigrateError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to database: {0}")]
    Connect(#[source] diesel::ConnectionError),
    #[error("migration failed: {0}")]
    Apply(#[source] diesel::result::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn parse(arg: &str) -> Result<Self, MigrateError> {
        match arg {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(MigrateError::InvalidArgs(format!(
                "unknown direction '{other}'; expected up or down"
            ))),
        }
    }

    const fn sql(self) -> &'static str {
        match self {
            Self::Up => UP_SQL,
            Self::Down => DOWN_SQL,
        }
    }
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(env::args().skip(1)) {
        tracing::error!(error = %err, "migration aborted");
        return Err(err.into());
    }
    Ok(())
}

fn run(args: impl Iterator<Item = String>) -> Result<(), MigrateError> {
    let (direction, config_path) = parse_args(args)?;
    let config = EngineConfig::load_or_default(&config_path)?;

    let mut connection =
        PgConnection::establish(&config.database.url).map_err(MigrateError::Connect)?;
    connection
        .transaction::<_, diesel::result::Error, _>(|tx| tx.batch_execute(direction.sql()))
        .map_err(MigrateError::Apply)?;

    tracing::info!(
        direction = ?direction,
        config = %config_path.display(),
        "workflow schema migration applied"
    );
    Ok(())
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(Direction, PathBuf), MigrateError> {
    let direction = args
        .next()
        .ok_or_else(|| MigrateError::InvalidArgs("missing direction argument".into()))
        .and_then(|arg| Direction::parse(&arg))?;
    let config_path = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if let Some(extra) = args.next() {
        return Err(MigrateError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok((direction, config_path))
}
