//! Unit tests for the UAT workflow.
