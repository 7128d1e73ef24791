//! Fixtures for in-memory workflow integration tests.

use std::sync::Arc;

use crate::test_helpers::Workflow;
use rstest::fixture;
use uatflow::workflow::adapters::memory::InMemoryWorkflowRepository;

pub type MemoryWorkflow = Workflow<InMemoryWorkflowRepository>;

/// Provides services over a fresh in-memory repository.
#[fixture]
pub fn workflow() -> MemoryWorkflow {
    Workflow::new(Arc::new(InMemoryWorkflowRepository::new()))
}
