//! Identifier types for the UAT workflow domain.
//!
//! Every record is keyed by a UUID newtype so that a bug report identifier can
//! never be passed where a task identifier is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random ", $label, " identifier.")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a ", $label, " identifier from an existing UUID.")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a UAT task (one worker executing one test case).
    TaskId,
    "task"
);

uuid_identifier!(
    /// Unique identifier for a bug report filed against a task.
    BugReportId,
    "bug report"
);

uuid_identifier!(
    /// Unique identifier for a QA determination on a single bug report.
    BugValidationId,
    "bug validation"
);

uuid_identifier!(
    /// Unique identifier for a QA determination on a whole task.
    TaskValidationId,
    "task validation"
);

uuid_identifier!(
    /// Unique identifier for a piece of test evidence.
    EvidenceId,
    "evidence"
);

uuid_identifier!(
    /// Identity of a worker or QA specialist, supplied by the auth layer.
    UserId,
    "user"
);

uuid_identifier!(
    /// Application under test.
    ApplicationId,
    "application"
);

uuid_identifier!(
    /// Test case executed by a task.
    TestCaseId,
    "test case"
);
