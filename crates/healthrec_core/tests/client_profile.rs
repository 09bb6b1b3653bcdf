use chrono::NaiveDate;
use healthrec_core::db::open_db_in_memory;
use healthrec_core::{
    sqlite_enrollment_service, ClientService, EnrollmentServiceError, NewClient, ProgramService,
    SqliteClientRepository, SqliteProgramRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn register(conn: &Connection, first_name: &str, last_name: &str) -> healthrec_core::Client {
    ClientService::new(SqliteClientRepository::try_new(conn).unwrap())
        .register_client(NewClient {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2001, 1, 15).unwrap(),
            gender: "other".to_string(),
            contact_number: "0733111222".to_string(),
            address: "Mombasa".to_string(),
        })
        .unwrap()
}

fn create_program(conn: &Connection, name: &str) -> healthrec_core::Program {
    ProgramService::new(SqliteProgramRepository::try_new(conn).unwrap())
        .create_program(name)
        .unwrap()
}

#[test]
fn profile_without_enrollment_has_empty_program_list() {
    let conn = open_db_in_memory().unwrap();
    let client = register(&conn, "Kevin", "Odhiambo");
    let service = sqlite_enrollment_service(&conn).unwrap();

    let profile = service.get_client_profile(client.id).unwrap();

    assert_eq!(profile.client, client);
    assert!(profile.enrolled_programs.is_empty());
}

#[test]
fn profile_resolves_program_names_in_enrollment_order() {
    let conn = open_db_in_memory().unwrap();
    let client = register(&conn, "Kevin", "Odhiambo");
    let malaria = create_program(&conn, "Malaria");
    let tb = create_program(&conn, "TB");
    let service = sqlite_enrollment_service(&conn).unwrap();

    service.enroll(client.id, &[tb.id]).unwrap();
    service.enroll(client.id, &[malaria.id, tb.id]).unwrap();

    let profile = service.get_client_profile(client.id).unwrap();
    let names: Vec<_> = profile
        .enrolled_programs
        .iter()
        .map(|program| program.name.as_str())
        .collect();
    assert_eq!(names, vec!["TB", "Malaria"]);
}

#[test]
fn profile_of_unknown_client_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = sqlite_enrollment_service(&conn).unwrap();

    let err = service.get_client_profile(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::ClientNotFound(_)));
}

#[test]
fn profile_serializes_with_enrolled_programs_key() {
    let conn = open_db_in_memory().unwrap();
    let client = register(&conn, "Kevin", "Odhiambo");
    let hiv = create_program(&conn, "HIV");
    let service = sqlite_enrollment_service(&conn).unwrap();
    service.enroll(client.id, &[hiv.id]).unwrap();

    let value = serde_json::to_value(service.get_client_profile(client.id).unwrap()).unwrap();

    assert_eq!(value["client"]["firstName"], "Kevin");
    assert_eq!(value["enrolledPrograms"][0]["name"], "HIV");
    assert_eq!(value["enrolledPrograms"][0]["id"], hiv.id.to_string());
}

#[test]
fn list_enrollments_populates_client_and_program_names() {
    let conn = open_db_in_memory().unwrap();
    let first = register(&conn, "Kevin", "Odhiambo");
    let second = register(&conn, "Lucy", "Chebet");
    let malaria = create_program(&conn, "Malaria");
    let tb = create_program(&conn, "TB");
    let service = sqlite_enrollment_service(&conn).unwrap();

    service.enroll(first.id, &[malaria.id]).unwrap();
    service.enroll(second.id, &[tb.id, malaria.id]).unwrap();

    let views = service.list_enrollments().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].client.id, first.id);
    assert_eq!(views[0].programs, vec![malaria.clone()]);
    assert_eq!(views[1].client.last_name, "Chebet");
    assert_eq!(views[1].programs, vec![tb, malaria]);

    let value = serde_json::to_value(&views[1]).unwrap();
    assert_eq!(value["clientId"]["firstName"], "Lucy");
    assert_eq!(value["programs"][0]["name"], "TB");
    assert!(value["enrollmentDate"].is_string());
}
