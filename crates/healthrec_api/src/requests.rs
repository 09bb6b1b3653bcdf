//! Request body schemas and boundary validation.
//!
//! Fields accept any JSON value so a present field of the wrong type gets
//! the same field-level message as the form UI shows, not a deserializer
//! error. A missing or `null` field reads as absent.

use crate::error::ApiError;
use healthrec_core::{parse_date_of_birth, ClientId, NewClient, ProgramId};
use serde::de::IgnoredAny;
use serde::Deserialize;
use uuid::Uuid;

/// A body field expected to hold a JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Text(String),
    Other(IgnoredAny),
}

impl TextField {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Other(_) => None,
        }
    }
}

impl From<&str> for TextField {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A body field expected to hold a JSON array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<TextField>),
    Other(IgnoredAny),
}

/// `POST /api/programs` body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProgramRequest {
    pub name: Option<TextField>,
}

impl CreateProgramRequest {
    /// Returns the program name, trimmed.
    pub fn validate(self) -> Result<String, ApiError> {
        let name = self
            .name
            .as_ref()
            .and_then(TextField::as_text)
            .map(str::trim)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(invalid("Program name is required and must be a string."));
        }
        Ok(name.to_string())
    }
}

/// `POST /api/clients` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterClientRequest {
    pub first_name: Option<TextField>,
    pub last_name: Option<TextField>,
    pub date_of_birth: Option<TextField>,
    pub gender: Option<TextField>,
    pub contact_number: Option<TextField>,
    pub address: Option<TextField>,
}

impl RegisterClientRequest {
    /// Checks presence of every field, then names, date, and the
    /// remaining fields in form order.
    pub fn validate(self) -> Result<NewClient, ApiError> {
        let (
            Some(first_name),
            Some(last_name),
            Some(date_of_birth),
            Some(gender),
            Some(contact_number),
            Some(address),
        ) = (
            present(self.first_name),
            present(self.last_name),
            present(self.date_of_birth),
            present(self.gender),
            present(self.contact_number),
            present(self.address),
        )
        else {
            return Err(invalid("All client fields are required."));
        };

        let (Some(first_name), Some(last_name)) = (first_name.as_text(), last_name.as_text())
        else {
            return Err(invalid("First and last names must be strings."));
        };

        let date_of_birth = date_of_birth
            .as_text()
            .and_then(|text| parse_date_of_birth(text).ok())
            .ok_or_else(|| invalid("Invalid date format. Use YYYY-MM-DD."))?;

        let gender = gender
            .as_text()
            .ok_or_else(|| invalid("Gender must be a string"))?;
        let contact_number = contact_number
            .as_text()
            .ok_or_else(|| invalid("Contact Number must be a string"))?;
        let address = address
            .as_text()
            .ok_or_else(|| invalid("Address must be a string"))?;

        Ok(NewClient {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth,
            gender: gender.to_string(),
            contact_number: contact_number.to_string(),
            address: address.to_string(),
        })
    }
}

/// `POST /api/enrollments` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub client_id: Option<TextField>,
    pub program_ids: Option<ListField>,
}

/// Enrollment request with parsed identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollCommand {
    pub client_id: ClientId,
    /// Ids that parsed as UUIDs, in request order.
    pub program_ids: Vec<ProgramId>,
    /// Count of program ids that are not UUIDs and so cannot exist.
    pub malformed_program_ids: usize,
}

impl EnrollRequest {
    /// Checks presence first, then id syntax.
    ///
    /// A client id that is not a UUID string is reported as not found.
    /// Malformed program ids are counted so the caller can still check the
    /// client before reporting missing programs.
    pub fn validate(self) -> Result<EnrollCommand, ApiError> {
        let client_id = present(self.client_id).ok_or_else(|| invalid("clientId is required."))?;
        let program_ids = match self.program_ids {
            Some(ListField::Items(ids)) if !ids.is_empty() => ids,
            _ => return Err(invalid("programIds must be a non-empty array.")),
        };

        let client_id = client_id
            .as_text()
            .and_then(|text| Uuid::parse_str(text.trim()).ok())
            .ok_or(ApiError::ClientNotFound)?;
        let requested = program_ids.len();
        let program_ids: Vec<ProgramId> = program_ids
            .iter()
            .filter_map(TextField::as_text)
            .filter_map(|text| Uuid::parse_str(text.trim()).ok())
            .collect();

        Ok(EnrollCommand {
            client_id,
            malformed_program_ids: requested - program_ids.len(),
            program_ids,
        })
    }
}

/// `GET /api/clients` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ClientSearchParams {
    pub search: Option<String>,
}

/// Drops absent fields and blank strings; non-string values count as present.
fn present(value: Option<TextField>) -> Option<TextField> {
    value.filter(|field| match field {
        TextField::Text(text) => !text.trim().is_empty(),
        TextField::Other(_) => true,
    })
}

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{CreateProgramRequest, EnrollRequest, ListField, RegisterClientRequest, TextField};
    use crate::error::ApiError;
    use serde_json::json;
    use uuid::Uuid;

    fn full_client_request() -> RegisterClientRequest {
        RegisterClientRequest {
            first_name: Some("Amina".into()),
            last_name: Some("Otieno".into()),
            date_of_birth: Some("1990-04-12".into()),
            gender: Some("female".into()),
            contact_number: Some("0700000000".into()),
            address: Some("Kisumu".into()),
        }
    }

    fn client_error(body: serde_json::Value) -> String {
        let request: RegisterClientRequest =
            serde_json::from_value(body).expect("any JSON types should deserialize");
        request.validate().unwrap_err().to_string()
    }

    #[test]
    fn program_name_is_trimmed_and_required() {
        let ok = CreateProgramRequest {
            name: Some("  TB ".into()),
        };
        assert_eq!(ok.validate().unwrap(), "TB");

        let missing = CreateProgramRequest::default().validate().unwrap_err();
        assert!(matches!(missing, ApiError::Validation(_)));

        let numeric: CreateProgramRequest = serde_json::from_value(json!({ "name": 7 })).unwrap();
        assert_eq!(
            numeric.validate().unwrap_err().to_string(),
            "Program name is required and must be a string."
        );
    }

    #[test]
    fn client_request_requires_every_field() {
        let mut request = full_client_request();
        request.gender = None;
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "All client fields are required.");
    }

    #[test]
    fn client_request_rejects_non_iso_dates() {
        let mut request = full_client_request();
        request.date_of_birth = Some("12/04/1990".into());
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid date format. Use YYYY-MM-DD.");
    }

    #[test]
    fn client_request_reports_wrong_types_per_field() {
        let base = json!({
            "firstName": "Amina",
            "lastName": "Otieno",
            "dateOfBirth": "1990-04-12",
            "gender": "female",
            "contactNumber": "0700000000",
            "address": "Kisumu"
        });
        let with = |field: &str, value: serde_json::Value| {
            let mut body = base.clone();
            body[field] = value;
            body
        };

        assert_eq!(
            client_error(with("firstName", json!(1))),
            "First and last names must be strings."
        );
        assert_eq!(
            client_error(with("dateOfBirth", json!(19900412))),
            "Invalid date format. Use YYYY-MM-DD."
        );
        assert_eq!(
            client_error(with("gender", json!(["f"]))),
            "Gender must be a string"
        );
        assert_eq!(
            client_error(with("contactNumber", json!(700000000))),
            "Contact Number must be a string"
        );
        assert_eq!(
            client_error(with("address", json!({ "city": "Kisumu" }))),
            "Address must be a string"
        );
        assert_eq!(
            client_error(with("address", json!(null))),
            "All client fields are required."
        );
    }

    #[test]
    fn enroll_request_parses_ids() {
        let client = Uuid::new_v4();
        let program = Uuid::new_v4();
        let command = EnrollRequest {
            client_id: Some(client.to_string().as_str().into()),
            program_ids: Some(ListField::Items(vec![program.to_string().as_str().into()])),
        }
        .validate()
        .unwrap();
        assert_eq!(command.client_id, client);
        assert_eq!(command.program_ids, vec![program]);
        assert_eq!(command.malformed_program_ids, 0);
    }

    #[test]
    fn enroll_request_rejects_malformed_client_and_counts_malformed_programs() {
        let bad_client = EnrollRequest {
            client_id: Some("nope".into()),
            program_ids: Some(ListField::Items(vec!["also-nope".into()])),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(bad_client, ApiError::ClientNotFound));

        let program = Uuid::new_v4();
        let request: EnrollRequest = serde_json::from_value(json!({
            "clientId": Uuid::new_v4(),
            "programIds": ["also-nope", 42, program]
        }))
        .unwrap();
        let command = request.validate().unwrap();
        assert_eq!(command.malformed_program_ids, 2);
        assert_eq!(command.program_ids, vec![program]);
    }

    #[test]
    fn enroll_request_requires_program_id_array() {
        let empty = EnrollRequest {
            client_id: Some(Uuid::new_v4().to_string().as_str().into()),
            program_ids: Some(ListField::Items(Vec::new())),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(empty, ApiError::Validation(_)));

        let scalar: EnrollRequest = serde_json::from_value(json!({
            "clientId": Uuid::new_v4(),
            "programIds": "not-a-list"
        }))
        .unwrap();
        assert_eq!(
            scalar.validate().unwrap_err().to_string(),
            "programIds must be a non-empty array."
        );
    }

    #[test]
    fn text_field_keeps_non_strings_apart() {
        let field: TextField = serde_json::from_value(json!(true)).unwrap();
        assert!(matches!(field, TextField::Other(_)));
    }
}
