//! Health program model.

use super::{require_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a health program.
pub type ProgramId = Uuid;

/// A named health program clients can enroll in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    /// Display name, non-empty after trim.
    pub name: String,
}

impl Program {
    /// Creates a program with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a program with a caller-provided stable ID.
    pub fn with_id(id: ProgramId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.name, "name")
    }
}
