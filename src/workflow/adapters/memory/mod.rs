//! In-memory adapter for workflow persistence.

mod repository;

pub use repository::InMemoryWorkflowRepository;
