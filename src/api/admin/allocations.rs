use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::allocation::{
    AllocationCreate, AllocationQuery, AllocationResponse, AllocationUpdate,
};
use crate::schemas::MessageResponse;
use crate::services::hierarchy::filter_allocations;

const DUPLICATE_ALLOCATION: &str =
    "This teacher is already allocated to this subject and class for the academic year";

pub(super) async fn create_allocation(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AllocationCreate>,
) -> Result<(StatusCode, Json<AllocationResponse>), ApiError> {
    validate_payload(&payload)?;
    let teacher_id = payload.teacher_id.trim();
    let class_id = payload.class_id.trim();

    ensure_teacher(&state, teacher_id).await?;
    let academic_year_id = match payload.academic_year_id.as_deref().map(str::trim) {
        Some(year_id) if !year_id.is_empty() => year_id.to_string(),
        _ => year_of_class(&state, class_id).await?,
    };

    let id = Uuid::new_v4().to_string();
    repositories::allocations::create(
        state.db(),
        repositories::allocations::CreateAllocation {
            id: &id,
            teacher_id,
            subject_id: payload.subject_id.trim(),
            class_id,
            academic_year_id: &academic_year_id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_ALLOCATION, "Failed to create allocation"))?;

    tracing::info!(allocation_id = %id, teacher_id = %teacher_id, "allocation created");
    let row = fetch_allocation(&state, &id).await?;
    Ok((StatusCode::CREATED, Json(AllocationResponse::from_row(row))))
}

pub(super) async fn list_allocations(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<AllocationQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AllocationResponse>>, ApiError> {
    let rows = repositories::allocations::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list allocations"))?;

    let mut selection = query.selection;
    selection.drop_blank();

    let rows = filter_allocations(rows, query.q.as_deref(), &selection);
    Ok(Json(rows.into_iter().map(AllocationResponse::from_row).collect()))
}

pub(super) async fn update_allocation(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AllocationUpdate>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let trim = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let teacher_id = trim(payload.teacher_id);
    let class_id = trim(payload.class_id);
    let mut academic_year_id = trim(payload.academic_year_id);

    if let Some(teacher_id) = &teacher_id {
        ensure_teacher(&state, teacher_id).await?;
    }
    // moving to another class follows that class's year unless one is given
    if let (Some(class_id), None) = (&class_id, &academic_year_id) {
        academic_year_id = Some(year_of_class(&state, class_id).await?);
    }

    let updated = repositories::allocations::update(
        state.db(),
        &id,
        repositories::allocations::UpdateAllocation {
            teacher_id,
            subject_id: trim(payload.subject_id),
            class_id,
            academic_year_id,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, DUPLICATE_ALLOCATION, "Failed to update allocation"))?;
    if !updated {
        return Err(ApiError::NotFound("Allocation not found".to_string()));
    }

    let row = fetch_allocation(&state, &id).await?;
    Ok(Json(AllocationResponse::from_row(row)))
}

pub(super) async fn delete_allocation(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::allocations::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete allocation"))?;
    if !deleted {
        return Err(ApiError::NotFound("Allocation not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Allocation removed")))
}

async fn ensure_teacher(state: &AppState, teacher_id: &str) -> Result<(), ApiError> {
    repositories::users::find_person(state.db(), teacher_id, UserRole::Teacher)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher"))?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Teacher not found".to_string()))
}

async fn year_of_class(state: &AppState, class_id: &str) -> Result<String, ApiError> {
    repositories::academic_years::find_for_class(state.db(), class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve academic year"))?
        .ok_or_else(|| ApiError::BadRequest("Class not found".to_string()))
}

async fn fetch_allocation(
    state: &AppState,
    id: &str,
) -> Result<repositories::allocations::AllocationRow, ApiError> {
    repositories::allocations::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load allocation"))?
        .ok_or_else(|| ApiError::NotFound("Allocation not found".to_string()))
}
