//! Test evidence attached to a task's execution trail or to a bug report.

use super::{BugReportId, EvidenceId, ParseWorkflowValueError, TaskId, WorkflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record that evidence belongs to. Exactly one owner is ever set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EvidenceOwner {
    /// General execution trail of a task.
    Task(TaskId),
    /// A specific bug report.
    BugReport(BugReportId),
}

impl fmt::Display for EvidenceOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(id) => write!(f, "task {id}"),
            Self::BugReport(id) => write!(f, "bug report {id}"),
        }
    }
}

/// Behaviour-driven phase of the test step the evidence documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepContext {
    /// Precondition.
    Given,
    /// Action.
    When,
    /// Expected outcome.
    Then,
}

impl StepContext {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Given => "given",
            Self::When => "when",
            Self::Then => "then",
        }
    }
}

impl TryFrom<&str> for StepContext {
    type Error = ParseWorkflowValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "given" => Ok(Self::Given),
            "when" => Ok(Self::When),
            "then" => Ok(Self::Then),
            _ => Err(ParseWorkflowValueError::new("step context", value)),
        }
    }
}

/// One-based step number within the evidence trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct StepNumber(u32);

impl StepNumber {
    /// Creates a validated step number.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidStepNumber`] for zero.
    pub const fn new(value: u32) -> Result<Self, WorkflowError> {
        if value == 0 {
            return Err(WorkflowError::InvalidStepNumber(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for StepNumber {
    type Error = WorkflowError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StepNumber> for u32 {
    fn from(step: StepNumber) -> Self {
        step.value()
    }
}

/// Worker-supplied content of an evidence item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDraft {
    step_number: StepNumber,
    step_description: String,
    screenshot_ref: Option<String>,
    notes: Option<String>,
    context: Option<StepContext>,
}

impl EvidenceDraft {
    /// Creates a draft with the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::EmptyField`] when the step description is
    /// blank.
    pub fn new(
        step_number: StepNumber,
        step_description: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let raw = step_description.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::EmptyField("step description"));
        }
        Ok(Self {
            step_number,
            step_description: trimmed.to_owned(),
            screenshot_ref: None,
            notes: None,
            context: None,
        })
    }

    /// Sets the screenshot reference returned by the blob store.
    #[must_use]
    pub fn with_screenshot(mut self, screenshot_ref: impl Into<String>) -> Self {
        self.screenshot_ref = Some(screenshot_ref.into());
        self
    }

    /// Sets free-form notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the Given/When/Then context.
    #[must_use]
    pub const fn with_context(mut self, context: StepContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Screenshot and notes documenting one test step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEvidence {
    id: EvidenceId,
    owner: EvidenceOwner,
    step_number: StepNumber,
    step_description: String,
    screenshot_ref: Option<String>,
    notes: Option<String>,
    context: Option<StepContext>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing persisted evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEvidenceData {
    /// Persisted identifier.
    pub id: EvidenceId,
    /// Owning record.
    pub owner: EvidenceOwner,
    /// Step number.
    pub step_number: StepNumber,
    /// Step description.
    pub step_description: String,
    /// Screenshot reference.
    pub screenshot_ref: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Given/When/Then context.
    pub context: Option<StepContext>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TestEvidence {
    /// Creates evidence for `owner` from a draft.
    #[must_use]
    pub fn attach(owner: EvidenceOwner, draft: EvidenceDraft, at: DateTime<Utc>) -> Self {
        let EvidenceDraft {
            step_number,
            step_description,
            screenshot_ref,
            notes,
            context,
        } = draft;
        Self {
            id: EvidenceId::new(),
            owner,
            step_number,
            step_description,
            screenshot_ref,
            notes,
            context,
            created_at: at,
            updated_at: at,
        }
    }

    /// Reconstructs evidence from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEvidenceData) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            step_number: data.step_number,
            step_description: data.step_description,
            screenshot_ref: data.screenshot_ref,
            notes: data.notes,
            context: data.context,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Replaces the content with `draft`, keeping identity and owner.
    pub fn replace_content(&mut self, draft: EvidenceDraft, at: DateTime<Utc>) {
        self.step_number = draft.step_number;
        self.step_description = draft.step_description;
        self.screenshot_ref = draft.screenshot_ref;
        self.notes = draft.notes;
        self.context = draft.context;
        self.updated_at = at;
    }

    /// Returns the evidence identifier.
    #[must_use]
    pub const fn id(&self) -> EvidenceId {
        self.id
    }

    /// Returns the owning record.
    #[must_use]
    pub const fn owner(&self) -> EvidenceOwner {
        self.owner
    }

    /// Returns the step number.
    #[must_use]
    pub const fn step_number(&self) -> StepNumber {
        self.step_number
    }

    /// Returns the step description.
    #[must_use]
    pub fn step_description(&self) -> &str {
        &self.step_description
    }

    /// Returns the screenshot reference.
    #[must_use]
    pub fn screenshot_ref(&self) -> Option<&str> {
        self.screenshot_ref.as_deref()
    }

    /// Returns free-form notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the Given/When/Then context.
    #[must_use]
    pub const fn context(&self) -> Option<StepContext> {
        self.context
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last edit timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
