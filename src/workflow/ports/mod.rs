//! Port contracts for the UAT workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod repository;

pub use repository::{WorkflowRepository, WorkflowRepositoryError, WorkflowRepositoryResult};
