//! Liveness endpoint with a database probe.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use healthrec_core::db::migrations::{current_user_version, latest_version};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
    version: &'static str,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /api/health
///
/// Returns 200 when the database answers and carries the schema this
/// build writes, 503 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let probe = state
        .run(|conn| {
            let version =
                current_user_version(conn).map_err(|err| ApiError::Store(err.to_string()))?;
            if version != latest_version() {
                return Err(ApiError::Store(format!(
                    "schema version {version}, expected {}",
                    latest_version()
                )));
            }
            Ok(())
        })
        .await;

    let (status_code, status, database) = match probe {
        Ok(()) => (
            StatusCode::OK,
            "healthy",
            DatabaseHealth {
                status: "ok",
                error: None,
            },
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            DatabaseHealth {
                status: "error",
                error: Some(err.to_string()),
            },
        ),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            database,
            version: healthrec_core::core_version(),
        }),
    )
}
