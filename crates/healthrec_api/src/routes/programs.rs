//! Program registry endpoints.

use crate::error::ApiError;
use crate::requests::CreateProgramRequest;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use healthrec_core::{Program, ProgramService, SqliteProgramRepository};

/// POST /api/programs
pub async fn create_program_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateProgramRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Program>), ApiError> {
    let Json(request) = payload?;
    let name = request.validate()?;

    let program = state
        .run(move |conn| {
            let service = ProgramService::new(SqliteProgramRepository::try_new(conn)?);
            Ok(service.create_program(name)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(program)))
}

/// GET /api/programs
pub async fn list_programs_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Program>>, ApiError> {
    let programs = state
        .run(|conn| {
            let service = ProgramService::new(SqliteProgramRepository::try_new(conn)?);
            Ok(service.list_programs()?)
        })
        .await?;

    Ok(Json(programs))
}
