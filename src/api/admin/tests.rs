use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::config::Settings;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::roster_import;
use crate::test_support::{self, TestContext};

async fn admin_token(ctx: &TestContext) -> String {
    let admin = test_support::insert_user(
        ctx.state.db(),
        "ADMIN-T",
        "Admin",
        UserRole::Admin,
        Some("admin-pass"),
        None,
    )
    .await;
    test_support::bearer_token(&admin, ctx.state.settings())
}

async fn send(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(token), body))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn roster_upload_without_file_is_rejected() {
    let _guard = test_support::env_lock().await;
    test_support::set_test_env();
    let settings = Settings::load().expect("settings");
    let token = crate::core::security::create_access_token(
        "admin-1",
        UserRole::Admin,
        "Admin",
        &settings,
        None,
    )
    .expect("token");
    let app = crate::api::router::router(test_support::lazy_state(settings).await);

    let response = app
        .oneshot(test_support::multipart_request(
            "/api/admin/upload/users",
            Some(&token),
            &[("default_role", "STUDENT")],
            &[],
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(test_support::read_json(response).await["detail"], "No file uploaded.");
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn semester_activation_follows_its_year() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let seeded = test_support::seed_class(ctx.state.db(), "A").await;

    let (status, body) = send(
        &ctx,
        Method::PUT,
        &format!("/api/admin/semesters/{}/status", seeded.semester_id),
        &token,
        Some(json!({"is_active": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_active"], true);

    // deactivating the year switches its semesters off
    let (status, _) = send(
        &ctx,
        Method::PUT,
        &format!("/api/admin/years/{}/status", seeded.academic_year_id),
        &token,
        Some(json!({"is_active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let semester = repositories::semesters::find_by_id(ctx.state.db(), &seeded.semester_id)
        .await
        .expect("find")
        .expect("semester");
    assert!(!semester.is_active);

    let (status, body) = send(
        &ctx,
        Method::PUT,
        &format!("/api/admin/semesters/{}/status", seeded.semester_id),
        &token,
        Some(json!({"is_active": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn activating_a_year_retires_the_other_years_of_its_department() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let seeded = test_support::seed_class(ctx.state.db(), "B").await;

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/years",
        &token,
        Some(json!({
            "name": "2026-27",
            "start_date": "2026-07-01",
            "end_date": "2027-06-30",
            "department_id": seeded.department_id,
            "is_active": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["is_active"], true);

    let previous =
        repositories::academic_years::find_by_id(ctx.state.db(), &seeded.academic_year_id)
            .await
            .expect("find")
            .expect("year");
    assert!(!previous.is_active);
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn semester_dates_outside_the_year_are_rejected() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let seeded = test_support::seed_class(ctx.state.db(), "C").await;

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/semesters",
        &token,
        Some(json!({
            "name": "Sem 2",
            "type": "EVEN",
            "academic_year_id": seeded.academic_year_id,
            "start_date": "2027-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/semesters",
        &token,
        Some(json!({
            "name": "Sem 2",
            "type": "EVEN",
            "year_id": seeded.academic_year_id,
            "start_date": "2026-01-01",
            "end_date": "2026-05-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["is_active"], false);
    assert_eq!(body["department_id"], seeded.department_id.as_str());
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn year_cannot_shrink_past_its_semesters() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let seeded = test_support::seed_class(ctx.state.db(), "Y").await;

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/semesters",
        &token,
        Some(json!({
            "name": "Spring",
            "type": "EVEN",
            "academic_year_id": seeded.academic_year_id,
            "start_date": "2026-01-01",
            "end_date": "2026-05-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let uri = format!("/api/admin/years/{}", seeded.academic_year_id);
    let (status, body) =
        send(&ctx, Method::PUT, &uri, &token, Some(json!({ "end_date": "2025-12-31" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let year = repositories::academic_years::find_by_id(ctx.state.db(), &seeded.academic_year_id)
        .await
        .expect("load year")
        .expect("year exists");
    assert_eq!(year.end_date, time::macros::date!(2026 - 06 - 30));

    let (status, body) =
        send(&ctx, Method::PUT, &uri, &token, Some(json!({ "end_date": "2026-05-31" }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["end_date"], "2026-05-31");
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn duplicates_conflict() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let seeded = test_support::seed_class(ctx.state.db(), "D").await;
    let teacher = test_support::insert_user(
        ctx.state.db(),
        "T-D",
        "Dana Teacher",
        UserRole::Teacher,
        None,
        None,
    )
    .await;

    let subject = json!({"name": "Data Structures", "code": "CS201"});
    let (status, created) = send(&ctx, Method::POST, "/api/admin/subjects", &token, Some(subject.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let (status, body) = send(&ctx, Method::POST, "/api/admin/subjects", &token, Some(subject)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let allocation = json!({
        "teacher_id": teacher.id,
        "subject_id": created["id"],
        "class_id": seeded.class_id
    });
    let (status, body) =
        send(&ctx, Method::POST, "/api/admin/allocations", &token, Some(allocation.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["academic_year_id"], seeded.academic_year_id.as_str());
    assert_eq!(body["department_id"], seeded.department_id.as_str());
    assert_eq!(body["institute_id"], seeded.institute_id.as_str());

    let (status, body) =
        send(&ctx, Method::POST, "/api/admin/allocations", &token, Some(allocation)).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = send(
        &ctx,
        Method::GET,
        &format!("/api/admin/allocations?q=cs201&semester_id={}", seeded.semester_id),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) =
        send(&ctx, Method::GET, "/api/admin/allocations?q=nothing-matches", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn hierarchy_endpoint_drops_inconsistent_selection() {
    let ctx = test_support::setup_test_context().await;
    let token = admin_token(&ctx).await;
    let first = test_support::seed_class(ctx.state.db(), "E").await;
    let second = test_support::seed_class(ctx.state.db(), "F").await;

    let (status, body) = send(
        &ctx,
        Method::GET,
        &format!(
            "/api/admin/hierarchy?institute_id={}&department_id={}",
            first.institute_id, second.department_id
        ),
        &token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["selection"]["institute_id"], first.institute_id.as_str());
    assert!(body["selection"]["department_id"].is_null());
    assert_eq!(body["institutes"].as_array().map(Vec::len), Some(2));
    let departments = body["departments"].as_array().expect("departments");
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["id"], first.department_id.as_str());
    assert_eq!(body["classes"], json!([]));
}

fn roster_row(
    line: usize,
    enrollment: &str,
    role: &str,
    class_name: Option<&str>,
    subject_code: Option<&str>,
) -> roster_import::RosterRow {
    roster_import::RosterRow {
        line,
        name: format!("Person {enrollment}"),
        email: format!("{}@example.edu", enrollment.to_lowercase()),
        enrollment_number: enrollment.to_string(),
        role: Some(role.to_string()),
        class_name: class_name.map(str::to_string),
        subject_code: subject_code.map(str::to_string),
    }
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn roster_import_upserts_rows_and_protects_admins() {
    let ctx = test_support::setup_test_context().await;
    let pool = ctx.state.db();
    let seeded = test_support::seed_class(pool, "R").await;
    repositories::subjects::create(
        pool,
        &uuid::Uuid::new_v4().to_string(),
        "Algebra",
        "ALG1",
        None,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("subject");

    test_support::insert_user(pool, "ADMIN-T", "Admin", UserRole::Admin, Some("pw"), None).await;
    let activated = test_support::insert_user(
        pool,
        "S-10",
        "Old Name",
        UserRole::Student,
        Some("student-pass"),
        Some(&seeded.class_id),
    )
    .await;
    test_support::insert_user(
        pool,
        "S-12",
        "Switcher",
        UserRole::Student,
        None,
        Some(&seeded.class_id),
    )
    .await;

    let mut email_clash = roster_row(4, "S-11", "student", Some("Class R"), None);
    email_clash.email = "admin-t@example.edu".to_string();
    let rows = vec![
        roster_row(2, "S-10", "student", Some("Class R"), None),
        roster_row(3, "T-10", "teacher", Some("Class R"), Some("ALG1")),
        email_clash,
        roster_row(5, "ADMIN-T", "student", Some("Class R"), None),
        roster_row(6, "S-12", "teacher", None, None),
    ];
    let defaults =
        roster_import::ImportDefaults { default_role: None, class_id: None, institute_id: None };

    let summary = roster_import::import(pool, &rows, &defaults).await.expect("import");
    assert_eq!(summary.users_processed, 3);
    assert_eq!(summary.allocations_made, 1);
    assert_eq!(summary.errors.len(), 2, "{:?}", summary.errors);
    assert!(summary.errors[0].starts_with("Row 4:"));
    assert!(summary.errors[1].starts_with("Row 5:"));

    let admin = repositories::users::find_by_enrollment(pool, "ADMIN-T")
        .await
        .expect("find")
        .expect("admin");
    assert_eq!(admin.role, UserRole::Admin);

    let student = repositories::users::find_by_enrollment(pool, "S-10")
        .await
        .expect("find")
        .expect("student");
    assert_eq!(student.id, activated.id);
    assert_eq!(student.name, "Person S-10");
    assert_eq!(student.password_hash, activated.password_hash);

    let switched = repositories::users::find_by_enrollment(pool, "S-12")
        .await
        .expect("find")
        .expect("switched");
    assert_eq!(switched.role, UserRole::Teacher);
    assert!(switched.class_id.is_none());

    let again = roster_import::import(pool, &rows, &defaults).await.expect("re-import");
    assert_eq!(again.users_processed, 3);
    assert_eq!(again.allocations_made, 0);
    assert_eq!(repositories::allocations::list(pool).await.expect("allocations").len(), 1);
}
