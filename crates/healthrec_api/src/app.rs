use crate::routes::{
    client_profile_handler, create_program_handler, enroll_handler, health_handler,
    list_clients_handler, list_enrollments_handler, list_programs_handler,
    register_client_handler,
};
use crate::state::AppState;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use log::info;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Builds the `/api` router over shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/programs",
            get(list_programs_handler).post(create_program_handler),
        )
        .route(
            "/api/clients",
            get(list_clients_handler).post(register_client_handler),
        )
        .route("/api/clients/:id", get(client_profile_handler))
        .route(
            "/api/enrollments",
            get(list_enrollments_handler).post(enroll_handler),
        )
        .route("/api/health", get(health_handler))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// Path only; query strings may carry client names.
async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        "event=http_request module=api status={} method={method} path={path} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
