//! Enrollment model and program-reference set semantics.
//!
//! # Invariants
//! - At most one enrollment exists per client.
//! - `programs` has no duplicates; order is first-insertion order.
//! - The program set only grows; there is no unenroll.

use super::client::{ClientId, ClientSummary};
use super::program::{Program, ProgramId};
use super::ModelValidationError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Stable identifier for an enrollment record.
pub type EnrollmentId = Uuid;

/// The record of which programs one client is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub client_id: ClientId,
    pub programs: Vec<ProgramId>,
    /// Set once when the record is first created. Millisecond precision.
    #[serde(rename = "enrollmentDate")]
    pub enrolled_at: DateTime<Utc>,
}

/// Enrollment with client and programs resolved for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub id: EnrollmentId,
    /// Populated client reference; keeps the `clientId` key of the raw record.
    #[serde(rename = "clientId")]
    pub client: ClientSummary,
    pub programs: Vec<Program>,
    #[serde(rename = "enrollmentDate")]
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Creates an enrollment stamped with the current time.
    ///
    /// Duplicate program ids collapse, keeping first occurrence order.
    pub fn new(client_id: ClientId, programs: &[ProgramId]) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            client_id,
            programs,
            Utc::now().trunc_subsecs(3),
        )
    }

    pub fn with_id(
        id: EnrollmentId,
        client_id: ClientId,
        programs: &[ProgramId],
        enrolled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client_id,
            programs: dedup_program_refs(programs),
            enrolled_at,
        }
    }

    /// Adds requested programs not yet present. Returns how many were added.
    pub fn merge_programs(&mut self, requested: &[ProgramId]) -> usize {
        let before = self.programs.len();
        self.programs = merge_program_refs(&self.programs, requested);
        self.programs.len() - before
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.programs.is_empty() {
            return Err(ModelValidationError::EmptyProgramSet);
        }
        let mut seen = HashSet::with_capacity(self.programs.len());
        for program_id in &self.programs {
            if !seen.insert(*program_id) {
                return Err(ModelValidationError::DuplicateProgram(*program_id));
            }
        }
        Ok(())
    }
}

/// Collapses duplicate ids, keeping the first occurrence of each.
pub fn dedup_program_refs(ids: &[ProgramId]) -> Vec<ProgramId> {
    merge_program_refs(&[], ids)
}

/// Set union of `existing` and `requested`.
///
/// Existing order is kept; newly added ids follow in request order.
pub fn merge_program_refs(existing: &[ProgramId], requested: &[ProgramId]) -> Vec<ProgramId> {
    let mut seen: HashSet<ProgramId> = HashSet::with_capacity(existing.len() + requested.len());
    let mut merged = Vec::with_capacity(existing.len() + requested.len());
    for id in existing.iter().chain(requested) {
        if seen.insert(*id) {
            merged.push(*id);
        }
    }
    merged
}
