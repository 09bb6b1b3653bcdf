//! Enrollment reconciliation use-cases.
//!
//! # Responsibility
//! - Validate that a client and every requested program exist before any
//!   write to the enrollment collection.
//! - Merge requested programs into the client's single enrollment record.
//! - Compose read-only client profile and enrollment listing views.
//!
//! # Invariants
//! - Validation failures persist nothing.
//! - The program set of an enrollment is a set union; it never shrinks.
//! - At most one enrollment write happens per `enroll` call, and none when
//!   the request adds nothing new.
//! - Read-then-write is not atomic here; callers sharing one store must
//!   serialize `enroll` calls (the HTTP layer holds a connection lock).

use crate::model::client::{Client, ClientId};
use crate::model::enrollment::{dedup_program_refs, Enrollment, EnrollmentView};
use crate::model::program::{Program, ProgramId};
use crate::repo::client_repo::ClientRepository;
use crate::repo::enrollment_repo::EnrollmentRepository;
use crate::repo::program_repo::ProgramRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from enrollment operations.
#[derive(Debug)]
pub enum EnrollmentServiceError {
    /// Referenced client does not exist.
    ClientNotFound(ClientId),
    /// At least one referenced program does not exist. Holds the first
    /// missing id in request order.
    ProgramNotFound(ProgramId),
    /// Request did not name any program.
    EmptyProgramList,
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Stored references point at records that cannot be loaded.
    InconsistentState(String),
}

impl Display for EnrollmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientNotFound(id) => write!(f, "client not found: {id}"),
            Self::ProgramNotFound(id) => write!(f, "program not found: {id}"),
            Self::EmptyProgramList => write!(f, "at least one program id is required"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent enrollment state: {details}")
            }
        }
    }
}

impl Error for EnrollmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EnrollmentServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Combined client view with resolved program names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub client: Client,
    /// Enrollment order; empty when the client has no enrollment.
    pub enrolled_programs: Vec<Program>,
}

/// Enrollment reconciler over the three collections.
pub struct EnrollmentService<C, P, E> {
    clients: C,
    programs: P,
    enrollments: E,
}

impl<C, P, E> EnrollmentService<C, P, E>
where
    C: ClientRepository,
    P: ProgramRepository,
    E: EnrollmentRepository,
{
    pub fn new(clients: C, programs: P, enrollments: E) -> Self {
        Self {
            clients,
            programs,
            enrollments,
        }
    }

    /// Enrolls a client in one or more programs.
    ///
    /// Creates the client's enrollment on first use, otherwise adds the
    /// programs not already present. Duplicate ids in `program_ids`
    /// collapse. Returns the stored enrollment.
    ///
    /// # Errors
    /// - `ClientNotFound` when `client_id` does not exist.
    /// - `EmptyProgramList` when `program_ids` is empty.
    /// - `ProgramNotFound` when any requested program does not exist.
    pub fn enroll(
        &self,
        client_id: ClientId,
        program_ids: &[ProgramId],
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let started_at = Instant::now();

        if self.clients.get_client(client_id)?.is_none() {
            warn!("event=enroll module=service status=rejected reason=client_not_found client_id={client_id}");
            return Err(EnrollmentServiceError::ClientNotFound(client_id));
        }

        let requested = dedup_program_refs(program_ids);
        if requested.is_empty() {
            return Err(EnrollmentServiceError::EmptyProgramList);
        }

        let found = self.programs.find_programs(&requested)?;
        if found.len() < requested.len() {
            let found_ids: HashSet<ProgramId> = found.iter().map(|program| program.id).collect();
            let missing = requested
                .iter()
                .copied()
                .find(|id| !found_ids.contains(id))
                .ok_or_else(|| {
                    EnrollmentServiceError::InconsistentState(
                        "program lookup returned fewer rows but no id is missing".to_string(),
                    )
                })?;
            warn!("event=enroll module=service status=rejected reason=program_not_found client_id={client_id} program_id={missing}");
            return Err(EnrollmentServiceError::ProgramNotFound(missing));
        }

        let (enrollment, added, created) = match self.enrollments.find_by_client(client_id)? {
            Some(mut existing) => {
                let added = existing.merge_programs(&requested);
                if added > 0 {
                    self.enrollments
                        .update_enrollment_programs(existing.id, &existing.programs)?;
                }
                (existing, added, false)
            }
            None => {
                let enrollment = Enrollment::new(client_id, &requested);
                self.enrollments.create_enrollment(&enrollment)?;
                let added = enrollment.programs.len();
                (enrollment, added, true)
            }
        };

        info!(
            "event=enroll module=service status=ok client_id={client_id} enrollment_id={} requested={} added={added} created={created} duration_ms={}",
            enrollment.id,
            requested.len(),
            started_at.elapsed().as_millis()
        );

        if added == 0 {
            return Ok(enrollment);
        }

        self.enrollments.find_by_client(client_id)?.ok_or_else(|| {
            EnrollmentServiceError::InconsistentState(format!(
                "enrollment for client {client_id} missing after write"
            ))
        })
    }

    /// Returns the client with the names of the programs it is enrolled in.
    ///
    /// A client without an enrollment has an empty program list.
    pub fn get_client_profile(
        &self,
        client_id: ClientId,
    ) -> Result<ClientProfile, EnrollmentServiceError> {
        let client = self
            .clients
            .get_client(client_id)?
            .ok_or(EnrollmentServiceError::ClientNotFound(client_id))?;

        let enrolled_programs = match self.enrollments.find_by_client(client_id)? {
            Some(enrollment) => self.resolve_programs(&enrollment.programs)?,
            None => Vec::new(),
        };

        Ok(ClientProfile {
            client,
            enrolled_programs,
        })
    }

    /// Lists every enrollment with client and program references resolved.
    pub fn list_enrollments(&self) -> Result<Vec<EnrollmentView>, EnrollmentServiceError> {
        let enrollments = self.enrollments.list_enrollments()?;
        let mut views = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let client = self.clients.get_client(enrollment.client_id)?.ok_or_else(|| {
                EnrollmentServiceError::InconsistentState(format!(
                    "enrollment {} references missing client {}",
                    enrollment.id, enrollment.client_id
                ))
            })?;
            views.push(EnrollmentView {
                id: enrollment.id,
                client: client.summary(),
                programs: self.resolve_programs(&enrollment.programs)?,
                enrolled_at: enrollment.enrolled_at,
            });
        }
        Ok(views)
    }

    fn resolve_programs(&self, ids: &[ProgramId]) -> Result<Vec<Program>, EnrollmentServiceError> {
        let mut by_id: HashMap<ProgramId, Program> = self
            .programs
            .find_programs(ids)?
            .into_iter()
            .map(|program| (program.id, program))
            .collect();

        ids.iter()
            .map(|id| {
                by_id.remove(id).ok_or_else(|| {
                    EnrollmentServiceError::InconsistentState(format!(
                        "enrollment references missing program {id}"
                    ))
                })
            })
            .collect()
    }
}
