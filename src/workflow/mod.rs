//! UAT task validation and revision workflow.
//!
//! The module decides when a task may be completed, when QA may validate it,
//! what each validation outcome does to it, and how the revision loop runs.
//! It follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
