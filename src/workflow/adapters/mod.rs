//! Adapter implementations for the [`WorkflowRepository`] port.
//!
//! - [`memory::InMemoryWorkflowRepository`]: thread-safe in-memory storage
//!   for tests and embedding
//! - [`postgres::PostgresWorkflowRepository`]: `PostgreSQL` persistence using
//!   Diesel
//!
//! [`WorkflowRepository`]: crate::workflow::ports::WorkflowRepository

pub mod memory;
pub mod postgres;
