//! Enrollment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store the per-client enrollment record and its ordered program set.
//! - Replace program sets atomically.
//!
//! # Invariants
//! - `enrollments.client_uuid` is unique: one enrollment per client.
//! - Program membership rows carry a `position` that preserves
//!   first-insertion order.
//! - Writes run inside one IMMEDIATE transaction each.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::client::ClientId;
use crate::model::enrollment::{Enrollment, EnrollmentId};
use crate::model::program::ProgramId;
use chrono::{DateTime, Utc};
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const ENROLLMENT_COLUMNS: &[&str] = &[
    "uuid",
    "client_uuid",
    "enrolled_at",
    "created_at",
    "updated_at",
];
const ENROLLMENT_PROGRAM_COLUMNS: &[&str] = &["enrollment_uuid", "program_uuid", "position"];

/// Repository interface for the enrollment collection.
pub trait EnrollmentRepository {
    /// Loads the enrollment keyed by client reference.
    fn find_by_client(&self, client_id: ClientId) -> RepoResult<Option<Enrollment>>;
    /// Inserts a new enrollment with its program set.
    fn create_enrollment(&self, enrollment: &Enrollment) -> RepoResult<EnrollmentId>;
    /// Replaces the full program set of an existing enrollment.
    fn update_enrollment_programs(
        &self,
        id: EnrollmentId,
        programs: &[ProgramId],
    ) -> RepoResult<()>;
    /// Lists all enrollments in creation order.
    fn list_enrollments(&self) -> RepoResult<Vec<Enrollment>>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("enrollments", ENROLLMENT_COLUMNS),
                ("enrollment_programs", ENROLLMENT_PROGRAM_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }

    fn begin_write(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn find_by_client(&self, client_id: ClientId) -> RepoResult<Option<Enrollment>> {
        let header = self
            .conn
            .query_row(
                "SELECT uuid, client_uuid, enrolled_at
                 FROM enrollments
                 WHERE client_uuid = ?1;",
                [client_id.to_string()],
                |row| Ok(read_enrollment_header(row)),
            )
            .optional()?;

        match header.transpose()? {
            Some(header) => Ok(Some(self.load_enrollment(header)?)),
            None => Ok(None),
        }
    }

    fn create_enrollment(&self, enrollment: &Enrollment) -> RepoResult<EnrollmentId> {
        enrollment.validate()?;

        let tx = self.begin_write()?;
        let inserted = tx.execute(
            "INSERT INTO enrollments (uuid, client_uuid, enrolled_at)
             VALUES (?1, ?2, ?3);",
            params![
                enrollment.id.to_string(),
                enrollment.client_id.to_string(),
                enrollment.enrolled_at.timestamp_millis(),
            ],
        );
        if let Err(err) = inserted {
            return Err(map_insert_error(err, enrollment.client_id));
        }

        insert_program_rows(&tx, enrollment.id, &enrollment.programs)?;
        tx.commit()?;

        Ok(enrollment.id)
    }

    fn update_enrollment_programs(
        &self,
        id: EnrollmentId,
        programs: &[ProgramId],
    ) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self.begin_write()?;

        let changed = tx.execute(
            "UPDATE enrollments
             SET updated_at = (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             WHERE uuid = ?1;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "enrollment",
                id,
            });
        }

        tx.execute(
            "DELETE FROM enrollment_programs WHERE enrollment_uuid = ?1;",
            [id_text.as_str()],
        )?;
        insert_program_rows(&tx, id, programs)?;
        tx.commit()?;

        Ok(())
    }

    fn list_enrollments(&self) -> RepoResult<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, client_uuid, enrolled_at
             FROM enrollments
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut enrollments = Vec::new();
        while let Some(row) = rows.next()? {
            let header = read_enrollment_header(row)?;
            enrollments.push(self.load_enrollment(header)?);
        }

        Ok(enrollments)
    }
}

impl SqliteEnrollmentRepository<'_> {
    fn load_enrollment(&self, header: EnrollmentHeader) -> RepoResult<Enrollment> {
        let programs = load_program_refs(self.conn, header.id)?;
        let enrollment = Enrollment {
            id: header.id,
            client_id: header.client_id,
            programs,
            enrolled_at: header.enrolled_at,
        };
        enrollment.validate()?;
        Ok(enrollment)
    }
}

struct EnrollmentHeader {
    id: EnrollmentId,
    client_id: ClientId,
    enrolled_at: DateTime<Utc>,
}

fn read_enrollment_header(row: &Row<'_>) -> RepoResult<EnrollmentHeader> {
    let uuid_text: String = row.get("uuid")?;
    let client_text: String = row.get("client_uuid")?;
    let enrolled_ms: i64 = row.get("enrolled_at")?;
    let enrolled_at = DateTime::from_timestamp_millis(enrolled_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{enrolled_ms}` in enrollments.enrolled_at"
        ))
    })?;

    Ok(EnrollmentHeader {
        id: parse_uuid(&uuid_text, "enrollments.uuid")?,
        client_id: parse_uuid(&client_text, "enrollments.client_uuid")?,
        enrolled_at,
    })
}

fn load_program_refs(conn: &Connection, id: EnrollmentId) -> RepoResult<Vec<ProgramId>> {
    let mut stmt = conn.prepare(
        "SELECT program_uuid
         FROM enrollment_programs
         WHERE enrollment_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut programs = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        programs.push(parse_uuid(&value, "enrollment_programs.program_uuid")?);
    }
    Ok(programs)
}

fn insert_program_rows(
    tx: &Transaction<'_>,
    id: EnrollmentId,
    programs: &[ProgramId],
) -> RepoResult<()> {
    let id_text = id.to_string();
    let mut stmt = tx.prepare(
        "INSERT INTO enrollment_programs (enrollment_uuid, program_uuid, position)
         VALUES (?1, ?2, ?3);",
    )?;
    for (position, program_id) in programs.iter().enumerate() {
        stmt.execute(params![
            id_text.as_str(),
            program_id.to_string(),
            position as i64
        ])?;
    }
    Ok(())
}

fn map_insert_error(err: rusqlite::Error, client_id: ClientId) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateEnrollment(client_id)
        }
        _ => err.into(),
    }
}
