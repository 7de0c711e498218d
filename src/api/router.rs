use axum::{
    extract::DefaultBodyLimit,
    http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    http::{HeaderName, Method, Request, Response},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::Span;

use crate::api::{admin, auth, handlers, student, teacher};
use crate::core::{config::Settings, state::AppState};
use crate::services::storage::PUBLIC_PREFIX;

/// Room for the non-file parts of a multipart body.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub(crate) fn router(state: AppState) -> Router {
    let cors = build_cors_layer(state.settings());
    let api_prefix = state.settings().api().api_prefix.clone();
    let body_limit =
        state.settings().uploads().max_upload_bytes() as usize + MULTIPART_OVERHEAD_BYTES;

    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/teacher", teacher::router())
        .nest("/student", student::router());

    let request_id_header = HeaderName::from_static("x-request-id");
    let request_id_header_for_span = request_id_header.clone();
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(move |request: &Request<_>| {
            let request_id = request
                .headers()
                .get(&request_id_header_for_span)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<axum::body::Body>, latency: Duration, _span: &Span| {
            let status_label = response.status().as_u16().to_string();
            metrics::counter!("http_requests_total", "status" => status_label.clone()).increment(1);
            metrics::histogram!("http_request_duration_seconds", "status" => status_label)
                .record(latency.as_secs_f64());
        });

    let mut router: Router<AppState> = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz).head(handlers::healthz))
        .route("/db-test", get(handlers::db_test))
        .nest(&api_prefix, api)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.uploads().root()));

    if state.settings().telemetry().prometheus_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings
        .cors()
        .origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            ORIGIN,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        // wildcard origin cannot be combined with allow_credentials
        base.allow_origin(Any)
    } else {
        base.allow_credentials(true).allow_origin(AllowOrigin::list(origins))
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use axum::{body::to_bytes, body::Body, http::Method, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::core::{config::Settings, metrics};
    use crate::db::types::UserRole;
    use crate::test_support;

    async fn app() -> axum::Router {
        let settings = Settings::load().expect("settings");
        router(test_support::lazy_state(settings).await)
    }

    fn token_for(role: UserRole, settings: &Settings) -> String {
        crate::core::security::create_access_token("user-1", role, "Test User", settings, None)
            .expect("token")
    }

    #[tokio::test]
    async fn root_returns_banner() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let response = app()
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["message"], "VeriViva API is running and ready!");
    }

    #[tokio::test]
    async fn metrics_disabled_returns_404() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let response = app()
            .await
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_enabled_returns_200() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("PROMETHEUS_ENABLED", "1");

        let settings = Settings::load().expect("settings");
        metrics::init(&settings).expect("metrics init");
        let app = router(test_support::lazy_state(settings).await);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .expect("response");

        std::env::set_var("PROMETHEUS_ENABLED", "0");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let uris =
            ["/api/admin/institutes", "/api/teacher/allocations", "/api/student/pending", "/api/auth/me"];
        for uri in uris {
            let response = app()
                .await
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(response.headers()["www-authenticate"], "Bearer");
        }
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden_before_any_query() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let cases = [
            ("/api/admin/institutes", UserRole::Teacher, "Admin access required"),
            ("/api/teacher/allocations", UserRole::Student, "Teacher access required"),
            ("/api/student/history", UserRole::Admin, "Student access required"),
        ];
        for (uri, role, detail) in cases {
            let token = token_for(role, &settings);
            let response = app()
                .await
                .oneshot(test_support::json_request(Method::GET, uri, Some(&token), None))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
            let json = test_support::read_json(response).await;
            assert_eq!(json["detail"], detail);
            assert_eq!(json["status"], 403);
        }
    }

    #[tokio::test]
    async fn me_echoes_token_claims() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");
        let token = token_for(UserRole::Teacher, &settings);

        let response = app()
            .await
            .oneshot(test_support::json_request(Method::GET, "/api/auth/me", Some(&token), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = test_support::read_json(response).await;
        assert_eq!(json["id"], "user-1");
        assert_eq!(json["role"], "TEACHER");
        assert_eq!(json["name"], "Test User");
    }

    #[tokio::test]
    async fn uploaded_files_are_served() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");
        let state = test_support::lazy_state(settings).await;
        let stored = state.uploads().save("question_file", "txt", b"hello").await.expect("save");
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/uploads/{}", stored.file_name))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
        state.uploads().discard(&stored).await;
    }

    #[tokio::test]
    async fn face_upload_without_image_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let response = app()
            .await
            .oneshot(test_support::multipart_request(
                "/api/auth/upload-face",
                None,
                &[("enrollment_number", "E1")],
                &[],
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = test_support::read_json(response).await;
        assert_eq!(json["detail"], "No image captured.");
    }
}
