use axum::http::{Method, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{Assignment, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::test_support::{self, SeededClass, TestContext};

struct Fixture {
    seeded: SeededClass,
    assignment: Assignment,
    student: User,
    student_token: String,
}

async fn fixture(ctx: &TestContext) -> Fixture {
    let pool = ctx.state.db();
    let seeded = test_support::seed_class(pool, "S").await;
    let now = primitive_now_utc();
    let subject = repositories::subjects::create(
        pool,
        &Uuid::new_v4().to_string(),
        "Networks",
        "NET1",
        None,
        now,
    )
    .await
    .expect("subject");
    let teacher =
        test_support::insert_user(pool, "T-S", "Tess", UserRole::Teacher, Some("pw"), None).await;
    let assignment = repositories::assignments::create(
        pool,
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            title: "Routing lab",
            description: Some("Configure OSPF"),
            question_file_url: None,
            solution_file_url: None,
            deadline: now,
            class_id: &seeded.class_id,
            subject_id: &subject.id,
            teacher_id: &teacher.id,
            created_at: now,
        },
    )
    .await
    .expect("assignment");
    let student = test_support::insert_user(
        pool,
        "S-1",
        "Stu Dent",
        UserRole::Student,
        Some("pw"),
        Some(&seeded.class_id),
    )
    .await;
    let student_token = test_support::bearer_token(&student, ctx.state.settings());

    Fixture { seeded, assignment, student, student_token }
}

async fn get_json(ctx: &TestContext, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
        .await
        .expect("response");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn submitting_moves_an_assignment_from_pending_to_history() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;

    let (status, pending) = get_json(&ctx, "/api/student/pending", &fx.student_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending[0]["id"], fx.assignment.id.as_str());
    assert_eq!(pending[0]["subject_code"], "NET1");
    assert_eq!(pending[0]["teacher_name"], "Tess");

    let submit = || {
        test_support::multipart_request(
            "/api/student/submit",
            Some(&fx.student_token),
            &[("assignment_id", fx.assignment.id.as_str())],
            &[("submission_file", "answer.pdf", b"%PDF-1.4 answer")],
        )
    };

    let response = ctx.app.clone().oneshot(submit()).await.expect("submit");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = test_support::read_json(response).await;
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["student_id"], fx.student.id.as_str());

    let response = ctx.app.clone().oneshot(submit()).await.expect("second submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (_, pending) = get_json(&ctx, "/api/student/pending", &fx.student_token).await;
    assert_eq!(pending, serde_json::json!([]));

    let (status, history) = get_json(&ctx, "/api/student/history", &fx.student_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["title"], "Routing lab");
    assert_eq!(history[0]["subject_name"], "Networks");
    assert_eq!(history[0]["id"], created["id"]);
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn submission_rules_reject_missing_files_and_foreign_classes() {
    let ctx = test_support::setup_test_context().await;
    let fx = fixture(&ctx).await;
    let other_class = test_support::seed_class(ctx.state.db(), "S2").await;
    let outsider = test_support::insert_user(
        ctx.state.db(),
        "S-2",
        "Out Sider",
        UserRole::Student,
        Some("pw"),
        Some(&other_class.class_id),
    )
    .await;
    let outsider_token = test_support::bearer_token(&outsider, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::multipart_request(
            "/api/student/submit",
            Some(&fx.student_token),
            &[("assignment_id", fx.assignment.id.as_str())],
            &[],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::multipart_request(
            "/api/student/submit",
            Some(&outsider_token),
            &[("assignment_id", fx.assignment.id.as_str())],
            &[("submission_file", "answer.pdf", b"%PDF")],
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_ne!(fx.seeded.class_id, other_class.class_id);
}

#[tokio::test]
#[ignore = "requires a local postgres test database"]
async fn details_are_private_to_the_owner() {
    let ctx = test_support::setup_test_context().await;
    let pool = ctx.state.db();
    let fx = fixture(&ctx).await;
    let submission = repositories::submissions::create(
        pool,
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &fx.assignment.id,
            student_id: &fx.student.id,
            file_url: "http://localhost:5000/uploads/submission_file-1-2.pdf",
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .expect("submission");

    sqlx::query(
        "INSERT INTO viva_sessions (id, submission_id, integrity_score, face_match_score)
         VALUES ('vs-1', $1, 0.92, 0.88)",
    )
    .bind(&submission.id)
    .execute(pool)
    .await
    .expect("viva session");
    sqlx::query(
        "INSERT INTO viva_logs (id, session_id, question_text, transcript, created_at) VALUES
            ('vl-2', 'vs-1', 'Why OSPF?', 'Link state', (now() AT TIME ZONE 'utc') + interval '1 minute'),
            ('vl-1', 'vs-1', 'What is a route?', 'A path', (now() AT TIME ZONE 'utc'))",
    )
    .execute(pool)
    .await
    .expect("viva logs");

    let uri = format!("/api/student/submissions/{}/details", submission.id);
    let (status, body) = get_json(&ctx, &uri, &fx.student_token).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["submission"]["id"], submission.id.as_str());
    assert_eq!(body["viva_session"]["integrity_score"], 0.92);
    assert_eq!(body["viva_logs"][0]["question_text"], "What is a route?");
    assert_eq!(body["viva_logs"][1]["question_text"], "Why OSPF?");
    assert!(body["ai_report"].is_null());

    let intruder = test_support::insert_user(
        pool,
        "S-3",
        "Nosy",
        UserRole::Student,
        Some("pw"),
        Some(&fx.seeded.class_id),
    )
    .await;
    let intruder_token = test_support::bearer_token(&intruder, ctx.state.settings());
    let (status, body) = get_json(&ctx, &uri, &intruder_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("submission").is_none());

    let (status, _) =
        get_json(&ctx, "/api/student/submissions/unknown/details", &fx.student_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
