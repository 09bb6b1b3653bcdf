//! Program registry use-cases.

use crate::model::program::Program;
use crate::model::ModelValidationError;
use crate::repo::program_repo::ProgramRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from program registry operations.
#[derive(Debug)]
pub enum ProgramServiceError {
    /// Program input failed validation.
    Validation(ModelValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ProgramServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent program state: {details}"),
        }
    }
}

impl Error for ProgramServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for ProgramServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Program registry facade over a repository implementation.
pub struct ProgramService<R: ProgramRepository> {
    repo: R,
}

impl<R: ProgramRepository> ProgramService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a program. The name is trimmed and must not be blank.
    pub fn create_program(&self, name: impl Into<String>) -> Result<Program, ProgramServiceError> {
        let program = Program::new(name.into().trim());
        let program_id = self.repo.create_program(&program)?;
        info!("event=program_create module=service status=ok program_id={program_id}");

        self.repo
            .get_program(program_id)?
            .ok_or(ProgramServiceError::InconsistentState(
                "created program not found in read-back",
            ))
    }

    pub fn list_programs(&self) -> RepoResult<Vec<Program>> {
        self.repo.list_programs()
    }
}
