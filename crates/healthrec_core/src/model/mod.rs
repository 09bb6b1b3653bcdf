//! Health-records domain model.
//!
//! # Responsibility
//! - Define canonical records for clients, programs and enrollments.
//! - Own field-level validation shared by repository write paths.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Records are never hard-deleted; enrollments only grow.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod client;
pub mod enrollment;
pub mod program;

/// Field-level validation failure for domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Required text field is empty after trim. Holds the external field name.
    BlankField(&'static str),
    /// Date input is not a valid `YYYY-MM-DD` calendar date.
    InvalidDate(String),
    /// Enrollment must reference at least one program.
    EmptyProgramSet,
    /// Enrollment program references must be unique.
    DuplicateProgram(Uuid),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::InvalidDate(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD")
            }
            Self::EmptyProgramSet => write!(f, "enrollment must reference at least one program"),
            Self::DuplicateProgram(id) => {
                write!(f, "enrollment references program {id} more than once")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField(field));
    }
    Ok(())
}
