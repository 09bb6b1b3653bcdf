//! Enrollment endpoints backed by the reconciler.

use crate::error::ApiError;
use crate::requests::EnrollRequest;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use healthrec_core::{
    sqlite_enrollment_service, ClientRepository, Enrollment, EnrollmentView,
    SqliteClientRepository,
};

/// POST /api/enrollments
///
/// Creates or merges the client's enrollment; answers 200 in both cases.
pub async fn enroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<Json<Enrollment>, ApiError> {
    let Json(request) = payload?;
    let command = request.validate()?;

    let enrollment = state
        .run(move |conn| {
            if command.malformed_program_ids > 0 {
                let clients = SqliteClientRepository::try_new(conn)?;
                if clients.get_client(command.client_id)?.is_none() {
                    return Err(ApiError::ClientNotFound);
                }
                return Err(ApiError::ProgramNotFound);
            }
            let service = sqlite_enrollment_service(conn)?;
            Ok(service.enroll(command.client_id, &command.program_ids)?)
        })
        .await?;

    Ok(Json(enrollment))
}

/// GET /api/enrollments
pub async fn list_enrollments_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentView>>, ApiError> {
    let enrollments = state
        .run(|conn| Ok(sqlite_enrollment_service(conn)?.list_enrollments()?))
        .await?;

    Ok(Json(enrollments))
}
