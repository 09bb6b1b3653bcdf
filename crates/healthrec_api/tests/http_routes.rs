use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use healthrec_api::{build_router, AppState};
use healthrec_core::db::open_db_in_memory;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    let conn = open_db_in_memory().expect("in-memory db should open");
    build_router(AppState::new(conn))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should answer");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, value)
}

async fn create_program(app: &Router, name: &str) -> String {
    let (status, body) = send(app, "POST", "/api/programs", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("program id").to_string()
}

async fn register_client(app: &Router, first: &str, last: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/clients",
        Some(json!({
            "firstName": first,
            "lastName": last,
            "dateOfBirth": "1988-02-29",
            "gender": "female",
            "contactNumber": "0711000000",
            "address": "Nakuru"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().expect("client id").to_string()
}

#[tokio::test]
async fn health_reports_database_ok() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[tokio::test]
async fn health_reports_unmigrated_database_as_unavailable() {
    let conn = rusqlite::Connection::open_in_memory().expect("raw connection should open");
    let app = build_router(AppState::new(conn));

    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["status"], "error");
    assert!(body["database"]["error"].is_string());
}

#[tokio::test]
async fn programs_are_created_and_listed() {
    let app = app();
    let malaria = create_program(&app, "Malaria").await;
    let tb = create_program(&app, "TB").await;

    let (status, body) = send(&app, "GET", "/api/programs", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|program| program["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec![malaria.as_str(), tb.as_str()]);
}

#[tokio::test]
async fn program_without_name_is_rejected() {
    let app = app();
    let (status, body) = send(&app, "POST", "/api/programs", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Program name is required and must be a string.");
}

#[tokio::test]
async fn client_registration_validates_fields_and_dates() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/clients",
        Some(json!({ "firstName": "Amina", "lastName": "Otieno" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All client fields are required.");

    let (status, body) = send(
        &app,
        "POST",
        "/api/clients",
        Some(json!({
            "firstName": "Amina",
            "lastName": "Otieno",
            "dateOfBirth": "29/02/1988",
            "gender": "female",
            "contactNumber": "0711000000",
            "address": "Nakuru"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid date format. Use YYYY-MM-DD.");
}

#[tokio::test]
async fn client_search_filters_by_full_name() {
    let app = app();
    register_client(&app, "Amina", "Otieno").await;
    register_client(&app, "Brian", "Kamau").await;

    let (status, body) = send(&app, "GET", "/api/clients?search=na%20Ot", None).await;
    assert_eq!(status, StatusCode::OK);
    let clients = body.as_array().expect("array");
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["firstName"], "Amina");
    assert_eq!(clients[0]["dateOfBirth"], "1988-02-29");

    let (_, all) = send(&app, "GET", "/api/clients", None).await;
    assert_eq!(all.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn enrollment_merges_programs_and_shows_in_profile() {
    let app = app();
    let malaria = create_program(&app, "Malaria").await;
    let tb = create_program(&app, "TB").await;
    let client = register_client(&app, "Amina", "Otieno").await;

    let (status, first) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": client, "programIds": [malaria, malaria] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["clientId"], client.as_str());
    assert_eq!(first["programs"], json!([malaria]));
    assert!(first["enrollmentDate"].is_string());

    let (status, second) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": client, "programIds": [tb, malaria] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["programs"], json!([malaria, tb]));
    assert_eq!(second["enrollmentDate"], first["enrollmentDate"]);

    let (status, profile) = send(&app, "GET", &format!("/api/clients/{client}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["client"]["id"], client.as_str());
    let names: Vec<&str> = profile["enrolledPrograms"]
        .as_array()
        .expect("array")
        .iter()
        .map(|program| program["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Malaria", "TB"]);

    let (status, list) = send(&app, "GET", "/api/enrollments", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().expect("array");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["clientId"]["firstName"], "Amina");
    assert_eq!(list[0]["programs"][1]["name"], "TB");
}

#[tokio::test]
async fn enrollment_errors_map_to_statuses() {
    let app = app();
    let malaria = create_program(&app, "Malaria").await;
    let client = register_client(&app, "Amina", "Otieno").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": Uuid::new_v4(), "programIds": [malaria] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Client not found");

    let (status, body) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": client, "programIds": [malaria, Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "One or more programs not found");

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": client, "programIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, "GET", "/api/enrollments", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let app = app();
    let client = register_client(&app, "Amina", "Otieno").await;

    let (status, _) = send(&app, "GET", "/api/clients/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": client, "programIds": ["nope"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/enrollments",
        Some(json!({ "clientId": Uuid::new_v4(), "programIds": ["nope"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_of_unenrolled_client_is_empty() {
    let app = app();
    let client = register_client(&app, "Brian", "Kamau").await;

    let (status, profile) = send(&app, "GET", &format!("/api/clients/{client}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["enrolledPrograms"], json!([]));
}

#[tokio::test]
async fn wrong_field_types_get_field_messages() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/clients",
        Some(json!({
            "firstName": 1,
            "lastName": "Otieno",
            "dateOfBirth": "1988-02-29",
            "gender": "female",
            "contactNumber": "0711000000",
            "address": "Nakuru"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "First and last names must be strings.");

    let (status, body) = send(
        &app,
        "POST",
        "/api/clients",
        Some(json!({
            "firstName": "Amina",
            "lastName": "Otieno",
            "dateOfBirth": "1988-02-29",
            "gender": false,
            "contactNumber": "0711000000",
            "address": "Nakuru"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Gender must be a string");

    let (status, body) = send(&app, "POST", "/api/programs", Some(json!({ "name": 12 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Program name is required and must be a string.");
}

#[tokio::test]
async fn unparseable_body_gets_fixed_message() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/programs")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .expect("request should build");

    let response = app.oneshot(request).await.expect("router should answer");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body: Value = serde_json::from_slice(&bytes).expect("body should be JSON");
    assert_eq!(body, json!({ "error": "Invalid request body." }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_enrollments_for_one_client_keep_every_program() {
    const PROGRAMS: usize = 32;

    let app = app();
    let client = register_client(&app, "Amina", "Otieno").await;
    let mut program_ids = Vec::with_capacity(PROGRAMS);
    for index in 0..PROGRAMS {
        program_ids.push(create_program(&app, &format!("Program {index}")).await);
    }

    let mut tasks = Vec::with_capacity(PROGRAMS);
    for program_id in &program_ids {
        let app = app.clone();
        let body = json!({ "clientId": client, "programIds": [program_id] });
        tasks.push(tokio::spawn(async move {
            send(&app, "POST", "/api/enrollments", Some(body)).await.0
        }));
    }
    for task in tasks {
        assert_eq!(task.await.expect("task should finish"), StatusCode::OK);
    }

    let (status, profile) = send(&app, "GET", &format!("/api/clients/{client}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let mut enrolled: Vec<String> = profile["enrolledPrograms"]
        .as_array()
        .expect("array")
        .iter()
        .map(|program| program["id"].as_str().expect("id").to_string())
        .collect();
    enrolled.sort();
    program_ids.sort();
    assert_eq!(enrolled, program_ids);

    let (_, list) = send(&app, "GET", "/api/enrollments", None).await;
    assert_eq!(list.as_array().expect("array").len(), 1);
}
