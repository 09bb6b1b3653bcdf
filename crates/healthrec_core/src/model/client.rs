//! Client (registered person) model.
//!
//! # Invariants
//! - Clients are immutable after registration.
//! - `date_of_birth` is a calendar date without time zone.

use super::{require_text, ModelValidationError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a registered client.
pub type ClientId = Uuid;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Registration input for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub contact_number: String,
    pub address: String,
}

/// A person registered in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub contact_number: String,
    pub address: String,
}

/// Compact client projection used by populated enrollment listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: ClientId,
    pub first_name: String,
    pub last_name: String,
}

impl Client {
    /// Creates a client from registration input with a generated stable ID.
    pub fn new(input: NewClient) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Creates a client with a caller-provided stable ID.
    pub fn with_id(id: ClientId, input: NewClient) -> Self {
        Self {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            contact_number: input.contact_number,
            address: input.address,
        }
    }

    /// Checks that every required text field is present.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text(&self.first_name, "firstName")?;
        require_text(&self.last_name, "lastName")?;
        require_text(&self.gender, "gender")?;
        require_text(&self.contact_number, "contactNumber")?;
        require_text(&self.address, "address")?;
        Ok(())
    }

    /// Returns `"{first_name} {last_name}"`, the form matched by name search.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> ClientSummary {
        ClientSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Parses a strict `YYYY-MM-DD` date of birth.
pub fn parse_date_of_birth(value: &str) -> Result<NaiveDate, ModelValidationError> {
    let trimmed = value.trim();
    if !ISO_DATE_RE.is_match(trimmed) {
        return Err(ModelValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ModelValidationError::InvalidDate(value.to_string()))
}
