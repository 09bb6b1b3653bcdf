//! Client repository contract and SQLite implementation.
//!
//! # Invariants
//! - Clients are insert-only; there is no update or delete path.
//! - Listing order is registration order.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::client::{Client, ClientId};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CLIENT_SELECT_SQL: &str = "SELECT
    uuid,
    first_name,
    last_name,
    date_of_birth,
    gender,
    contact_number,
    address
FROM clients";

const CLIENT_COLUMNS: &[&str] = &[
    "uuid",
    "first_name",
    "last_name",
    "date_of_birth",
    "gender",
    "contact_number",
    "address",
    "created_at",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query options for listing clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientListQuery {
    /// Case-sensitive substring match against `"{first_name} {last_name}"`.
    pub name_contains: Option<String>,
}

/// Repository interface for the client collection.
pub trait ClientRepository {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    fn list_clients(&self, query: &ClientListQuery) -> RepoResult<Vec<Client>>;
}

/// SQLite-backed client repository.
pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("clients", CLIENT_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn create_client(&self, client: &Client) -> RepoResult<ClientId> {
        client.validate()?;

        self.conn.execute(
            "INSERT INTO clients (
                uuid,
                first_name,
                last_name,
                date_of_birth,
                gender,
                contact_number,
                address
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                client.id.to_string(),
                client.first_name.as_str(),
                client.last_name.as_str(),
                client.date_of_birth.format(DATE_FORMAT).to_string(),
                client.gender.as_str(),
                client.contact_number.as_str(),
                client.address.as_str(),
            ],
        )?;

        Ok(client.id)
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!("{CLIENT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(read_client_row(row)),
            )
            .optional()?;

        client.transpose()
    }

    fn list_clients(&self, query: &ClientListQuery) -> RepoResult<Vec<Client>> {
        let mut sql = format!("{CLIENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(term) = query.name_contains.as_deref().filter(|term| !term.is_empty()) {
            sql.push_str(" AND instr(first_name || ' ' || last_name, ?) > 0");
            bind_values.push(Value::Text(term.to_string()));
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(read_client_row(row)?);
        }

        Ok(clients)
    }
}

fn read_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "clients.uuid")?;

    let dob_text: String = row.get("date_of_birth")?;
    let date_of_birth = NaiveDate::parse_from_str(&dob_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{dob_text}` in clients.date_of_birth"
        ))
    })?;

    let client = Client {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        date_of_birth,
        gender: row.get("gender")?,
        contact_number: row.get("contact_number")?,
        address: row.get("address")?,
    };
    client.validate()?;
    Ok(client)
}
