//! Program repository contract and SQLite implementation.
//!
//! # Invariants
//! - Programs are insert-only.
//! - Multi-id lookup returns each existing program once, whatever the
//!   number of times its id was requested.

use super::{ensure_connection_ready, parse_uuid, RepoResult};
use crate::model::program::{Program, ProgramId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const PROGRAM_COLUMNS: &[&str] = &["uuid", "name", "created_at"];

/// Repository interface for the program collection.
pub trait ProgramRepository {
    fn create_program(&self, program: &Program) -> RepoResult<ProgramId>;
    fn get_program(&self, id: ProgramId) -> RepoResult<Option<Program>>;
    /// Returns the programs whose ids are in `ids`, in creation order.
    fn find_programs(&self, ids: &[ProgramId]) -> RepoResult<Vec<Program>>;
    fn list_programs(&self) -> RepoResult<Vec<Program>>;
}

/// SQLite-backed program repository.
pub struct SqliteProgramRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProgramRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("programs", PROGRAM_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl ProgramRepository for SqliteProgramRepository<'_> {
    fn create_program(&self, program: &Program) -> RepoResult<ProgramId> {
        program.validate()?;

        self.conn.execute(
            "INSERT INTO programs (uuid, name) VALUES (?1, ?2);",
            params![program.id.to_string(), program.name.as_str()],
        )?;

        Ok(program.id)
    }

    fn get_program(&self, id: ProgramId) -> RepoResult<Option<Program>> {
        let program = self
            .conn
            .query_row(
                "SELECT uuid, name FROM programs WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(read_program_row(row)),
            )
            .optional()?;

        program.transpose()
    }

    fn find_programs(&self, ids: &[ProgramId]) -> RepoResult<Vec<Program>> {
        // Distinct ids keep the IN list short and the result duplicate-free.
        let distinct: BTreeSet<String> = ids.iter().map(ProgramId::to_string).collect();
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; distinct.len()].join(", ");
        let sql = format!(
            "SELECT uuid, name
             FROM programs
             WHERE uuid IN ({placeholders})
             ORDER BY created_at ASC, rowid ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(distinct.iter()))?;
        let mut programs = Vec::new();
        while let Some(row) = rows.next()? {
            programs.push(read_program_row(row)?);
        }

        Ok(programs)
    }

    fn list_programs(&self) -> RepoResult<Vec<Program>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, name
             FROM programs
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut programs = Vec::new();
        while let Some(row) = rows.next()? {
            programs.push(read_program_row(row)?);
        }

        Ok(programs)
    }
}

fn read_program_row(row: &Row<'_>) -> RepoResult<Program> {
    let uuid_text: String = row.get("uuid")?;
    let program = Program {
        id: parse_uuid(&uuid_text, "programs.uuid")?,
        name: row.get("name")?,
    };
    program.validate()?;
    Ok(program)
}
