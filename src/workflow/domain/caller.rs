//! Caller identity passed explicitly into every mutating operation.

use super::{ParseWorkflowValueError, UnauthorizedReason, UserId, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Crowd worker executing test cases.
    Worker,
    /// QA specialist validating bugs and tasks.
    QaSpecialist,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::QaSpecialist => "qa_specialist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "worker" => Ok(Self::Worker),
            "qa_specialist" => Ok(Self::QaSpecialist),
            _ => Err(ParseWorkflowValueError::new("role", value)),
        }
    }
}

/// Authenticated caller of a workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Caller {
    user_id: UserId,
    role: Role,
}

impl Caller {
    /// Creates a caller with an explicit role.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Creates a worker caller.
    #[must_use]
    pub const fn worker(user_id: UserId) -> Self {
        Self::new(user_id, Role::Worker)
    }

    /// Creates a QA specialist caller.
    #[must_use]
    pub const fn qa_specialist(user_id: UserId) -> Self {
        Self::new(user_id, Role::QaSpecialist)
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Ensures the caller holds `role`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthorized`] when the role differs.
    pub fn require_role(&self, role: Role) -> Result<(), WorkflowError> {
        if self.role == role {
            return Ok(());
        }
        Err(WorkflowError::Unauthorized {
            user_id: self.user_id,
            reason: UnauthorizedReason::RoleRequired(role),
        })
    }

    /// Ensures the caller is the worker identified by `worker_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthorized`] when the caller is not a
    /// worker or is a different worker.
    pub fn require_worker(&self, worker_id: UserId) -> Result<(), WorkflowError> {
        self.require_role(Role::Worker)?;
        if self.user_id == worker_id {
            return Ok(());
        }
        Err(WorkflowError::Unauthorized {
            user_id: self.user_id,
            reason: UnauthorizedReason::NotAssignedWorker,
        })
    }
}
