use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Insert/update failures: duplicates are 409, dangling references 400.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str, context: &str) -> Self {
        if db::is_unique_violation(&err) {
            Self::Conflict(conflict.to_string())
        } else if db::is_foreign_key_violation(&err) {
            Self::BadRequest("Referenced record does not exist".to_string())
        } else {
            Self::internal(err, context)
        }
    }

    /// Delete failures: rows still referenced elsewhere are 409.
    pub(crate) fn from_delete(err: sqlx::Error, context: &str) -> Self {
        if db::is_foreign_key_violation(&err) {
            Self::Conflict("Record is still referenced by other records".to_string())
        } else {
            Self::internal(err, context)
        }
    }

    fn parts(self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::TooManyRequests(message) => {
                (StatusCode::TOO_MANY_REQUESTS, message.to_string())
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let bearer_challenge = matches!(self, ApiError::Unauthorized(_));
        let (status, detail) = self.parts();

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();
        if bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, Option<HeaderValue>, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).cloned();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, challenge, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn unauthorized_carries_bearer_challenge() {
        let (status, challenge, body) = render(ApiError::Unauthorized("nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(challenge, Some(HeaderValue::from_static("Bearer")));
        assert_eq!(body, serde_json::json!({"status": 401, "detail": "nope"}));
    }

    #[tokio::test]
    async fn conflict_renders_status_and_detail() {
        let (status, challenge, body) = render(ApiError::Conflict("dup".to_string())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(challenge.is_none());
        assert_eq!(body["detail"], "dup");
        assert_eq!(body["status"], 409);
    }

    #[test]
    fn non_database_write_errors_become_internal() {
        let err = ApiError::from_write(sqlx::Error::RowNotFound, "dup", "Failed to insert");
        assert!(matches!(err, ApiError::Internal(ref context) if context == "Failed to insert"));
    }
}
