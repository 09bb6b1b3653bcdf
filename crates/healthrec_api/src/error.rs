//! HTTP error type and status mapping.
//!
//! Core errors are translated here and nowhere else. Caller input errors
//! keep their message; store failures are logged and answered with a
//! generic 500 body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use healthrec_core::{
    ClientServiceError, EnrollmentServiceError, ProgramServiceError, RepoError,
};
use log::{error, warn};
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error type for all API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request body failed schema or field validation.
    #[error("{0}")]
    Validation(String),

    /// Referenced client does not exist.
    #[error("Client not found")]
    ClientNotFound,

    /// At least one referenced program does not exist.
    #[error("One or more programs not found")]
    ProgramNotFound,

    /// Store failure (connectivity, constraint, corrupted row).
    #[error("store error: {0}")]
    Store(String),

    /// Server-side invariant broken or task failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::ProgramNotFound => StatusCode::BAD_REQUEST,
            Self::ClientNotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => {
                error!("event=http_error module=api status=error error={self}");
                "Failed to process request.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// Extractor details stay in the log; the body gets a fixed message.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(
            "event=http_reject module=api status=rejected kind=json http_status={} detail={}",
            rejection.status().as_u16(),
            rejection.body_text().replace(['\n', '\r'], " ")
        );
        Self::Validation("Invalid request body.".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(
            "event=http_reject module=api status=rejected kind=query detail={}",
            rejection.body_text().replace(['\n', '\r'], " ")
        );
        Self::Validation("Invalid query string.".to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<EnrollmentServiceError> for ApiError {
    fn from(err: EnrollmentServiceError) -> Self {
        match err {
            EnrollmentServiceError::ClientNotFound(_) => Self::ClientNotFound,
            EnrollmentServiceError::ProgramNotFound(_) => Self::ProgramNotFound,
            EnrollmentServiceError::EmptyProgramList => {
                Self::Validation("programIds must contain at least one program id.".to_string())
            }
            EnrollmentServiceError::Repo(err) => Self::Store(err.to_string()),
            EnrollmentServiceError::InconsistentState(details) => Self::Internal(details),
        }
    }
}

impl From<ClientServiceError> for ApiError {
    fn from(err: ClientServiceError) -> Self {
        match err {
            ClientServiceError::Validation(_) => {
                Self::Validation("All client fields are required.".to_string())
            }
            ClientServiceError::Repo(err) => Self::Store(err.to_string()),
            ClientServiceError::InconsistentState(details) => Self::Internal(details.to_string()),
        }
    }
}

impl From<ProgramServiceError> for ApiError {
    fn from(err: ProgramServiceError) -> Self {
        match err {
            ProgramServiceError::Validation(_) => Self::Validation(
                "Program name is required and must be a string.".to_string(),
            ),
            ProgramServiceError::Repo(err) => Self::Store(err.to_string()),
            ProgramServiceError::InconsistentState(details) => Self::Internal(details.to_string()),
        }
    }
}
