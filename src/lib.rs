//! Uatflow: task validation and revision workflow for crowd-sourced user
//! acceptance testing.
//!
//! Workers execute test cases, file bug reports, and attach evidence; QA
//! specialists validate each bug report and then the task as a whole, and
//! may send the task back for a bounded revision cycle.
//!
//! # Architecture
//!
//! Uatflow follows hexagonal architecture principles:
//!
//! - **Domain**: Pure workflow rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration of domain commands over a repository
//!
//! # Modules
//!
//! - [`workflow`]: Task lifecycle, bug validation, readiness, and revisions
//! - [`config`]: Engine configuration

pub mod config;
pub mod workflow;
