//! Client registry use-cases.
//!
//! # Invariants
//! - Registration is the only write; clients are never edited.

use crate::model::client::{Client, ClientId, NewClient};
use crate::model::ModelValidationError;
use crate::repo::client_repo::{ClientListQuery, ClientRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from client registry operations.
#[derive(Debug)]
pub enum ClientServiceError {
    /// Registration input failed validation.
    Validation(ModelValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ClientServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent client state: {details}"),
        }
    }
}

impl Error for ClientServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for ClientServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Client registry facade over a repository implementation.
pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new client and returns the stored record.
    pub fn register_client(&self, input: NewClient) -> Result<Client, ClientServiceError> {
        let client = Client::new(input);
        let client_id = self.repo.create_client(&client)?;
        info!("event=client_register module=service status=ok client_id={client_id}");

        self.repo
            .get_client(client_id)?
            .ok_or(ClientServiceError::InconsistentState(
                "registered client not found in read-back",
            ))
    }

    pub fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        self.repo.get_client(id)
    }

    /// Lists clients in registration order, optionally filtered by name.
    ///
    /// An empty search term matches every client.
    pub fn list_clients(&self, name_contains: Option<String>) -> RepoResult<Vec<Client>> {
        let query = ClientListQuery {
            name_contains: name_contains.filter(|term| !term.is_empty()),
        };
        self.repo.list_clients(&query)
    }
}
