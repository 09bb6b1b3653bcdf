//! Core domain logic for the health-records service.
//! This crate is the single source of truth for business invariants:
//! client/program registries and enrollment reconciliation over SQLite.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::client::{parse_date_of_birth, Client, ClientId, ClientSummary, NewClient};
pub use model::enrollment::{
    dedup_program_refs, merge_program_refs, Enrollment, EnrollmentId, EnrollmentView,
};
pub use model::program::{Program, ProgramId};
pub use model::ModelValidationError;
pub use repo::client_repo::{ClientListQuery, ClientRepository, SqliteClientRepository};
pub use repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
pub use repo::program_repo::{ProgramRepository, SqliteProgramRepository};
pub use repo::{RepoError, RepoResult};
pub use service::client_service::{ClientService, ClientServiceError};
pub use service::enrollment_service::{ClientProfile, EnrollmentService, EnrollmentServiceError};
pub use service::program_service::{ProgramService, ProgramServiceError};

/// Reconciler wired to the SQLite repositories.
pub type SqliteEnrollmentService<'conn> = EnrollmentService<
    SqliteClientRepository<'conn>,
    SqliteProgramRepository<'conn>,
    SqliteEnrollmentRepository<'conn>,
>;

/// Builds the SQLite-backed reconciler over one migrated connection.
pub fn sqlite_enrollment_service(
    conn: &rusqlite::Connection,
) -> RepoResult<SqliteEnrollmentService<'_>> {
    Ok(EnrollmentService::new(
        SqliteClientRepository::try_new(conn)?,
        SqliteProgramRepository::try_new(conn)?,
        SqliteEnrollmentRepository::try_new(conn)?,
    ))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
