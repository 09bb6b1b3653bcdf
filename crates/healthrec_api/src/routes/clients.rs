//! Client registry and profile endpoints.

use crate::error::ApiError;
use crate::requests::{ClientSearchParams, RegisterClientRequest};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use healthrec_core::{
    sqlite_enrollment_service, Client, ClientProfile, ClientService, SqliteClientRepository,
};
use uuid::Uuid;

/// POST /api/clients
pub async fn register_client_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let client = state
        .run(move |conn| {
            let service = ClientService::new(SqliteClientRepository::try_new(conn)?);
            Ok(service.register_client(input)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /api/clients?search=
///
/// `search` is a case-sensitive substring of "first last".
pub async fn list_clients_handler(
    State(state): State<AppState>,
    params: Result<Query<ClientSearchParams>, QueryRejection>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let Query(params) = params?;

    let clients = state
        .run(move |conn| {
            let service = ClientService::new(SqliteClientRepository::try_new(conn)?);
            Ok(service.list_clients(params.search)?)
        })
        .await?;

    Ok(Json(clients))
}

/// GET /api/clients/:id
pub async fn client_profile_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientProfile>, ApiError> {
    let client_id = Uuid::parse_str(&client_id).map_err(|_| ApiError::ClientNotFound)?;

    let profile = state
        .run(move |conn| Ok(sqlite_enrollment_service(conn)?.get_client_profile(client_id)?))
        .await?;

    Ok(Json(profile))
}
