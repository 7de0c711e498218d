use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::types::UserRole;

const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

/// Identity taken from a verified access token. No database lookup is made.
#[derive(Debug, Clone)]
pub(crate) struct AuthUser {
    pub(crate) id: String,
    pub(crate) role: UserRole,
    pub(crate) name: String,
}

pub(crate) struct CurrentUser(pub(crate) AuthUser);
pub(crate) struct CurrentAdmin(pub(crate) AuthUser);
pub(crate) struct CurrentTeacher(pub(crate) AuthUser);
pub(crate) struct CurrentStudent(pub(crate) AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        let claims = security::verify_token(token, state.settings())
            .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;

        Ok(CurrentUser(AuthUser { id: claims.sub, role: claims.role, name: claims.name }))
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    role: UserRole,
    denied: &'static str,
) -> Result<AuthUser, ApiError> {
    let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
    if user.role == role {
        Ok(user)
    } else {
        Err(ApiError::Forbidden(denied))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Admin, "Admin access required").await.map(CurrentAdmin)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentTeacher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Teacher, "Teacher access required")
            .await
            .map(CurrentTeacher)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, UserRole::Student, "Student access required")
            .await
            .map(CurrentStudent)
    }
}
