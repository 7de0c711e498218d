use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::subject::{SubjectCreate, SubjectResponse, SubjectUpdate};
use crate::schemas::MessageResponse;

const DUPLICATE_CODE: &str = "Subject code already exists";

pub(super) async fn create_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    validate_payload(&payload)?;
    let institute_id = payload.institute_id.as_deref().map(str::trim).filter(|v| !v.is_empty());

    let subject = repositories::subjects::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        payload.code.trim(),
        institute_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_CODE, "Failed to create subject"))?;

    Ok((StatusCode::CREATED, Json(SubjectResponse::from_db(&subject))))
}

pub(super) async fn list_subjects(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubjectResponse>>, ApiError> {
    let subjects = repositories::subjects::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list subjects"))?;
    Ok(Json(subjects.iter().map(SubjectResponse::from_db).collect()))
}

pub(super) async fn update_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SubjectUpdate>,
) -> Result<Json<SubjectResponse>, ApiError> {
    let trimmed = |value: &Option<String>| {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    };
    let name = trimmed(&payload.name);
    let code = trimmed(&payload.code);
    let institute_id = trimmed(&payload.institute_id);

    let subject = repositories::subjects::update(
        state.db(),
        &id,
        name.as_deref(),
        code.as_deref(),
        institute_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_CODE, "Failed to update subject"))?
    .ok_or_else(|| ApiError::NotFound("Subject not found".to_string()))?;
    Ok(Json(SubjectResponse::from_db(&subject)))
}

pub(super) async fn delete_subject(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::subjects::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete subject"))?;
    if !deleted {
        return Err(ApiError::NotFound("Subject not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Subject deleted")))
}
