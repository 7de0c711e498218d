use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{PersonResponse, PersonUpdate, StudentQuery};
use crate::schemas::MessageResponse;

pub(super) async fn list_teachers(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonResponse>>, ApiError> {
    list(&state, UserRole::Teacher, None).await
}

pub(super) async fn list_students(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<StudentQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonResponse>>, ApiError> {
    let class_id = query.class_id.as_deref().map(str::trim).filter(|v| !v.is_empty());
    list(&state, UserRole::Student, class_id).await
}

pub(super) async fn update_teacher(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<PersonUpdate>,
) -> Result<Json<PersonResponse>, ApiError> {
    update(&state, &id, UserRole::Teacher, payload).await
}

pub(super) async fn update_student(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<PersonUpdate>,
) -> Result<Json<PersonResponse>, ApiError> {
    update(&state, &id, UserRole::Student, payload).await
}

pub(super) async fn delete_teacher(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    delete(&state, &id, UserRole::Teacher).await
}

pub(super) async fn delete_student(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    delete(&state, &id, UserRole::Student).await
}

async fn list(
    state: &AppState,
    role: UserRole,
    class_id: Option<&str>,
) -> Result<Json<Vec<PersonResponse>>, ApiError> {
    let people = repositories::users::list_people(state.db(), role, class_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    Ok(Json(people.into_iter().map(PersonResponse::from_row).collect()))
}

async fn update(
    state: &AppState,
    id: &str,
    role: UserRole,
    payload: PersonUpdate,
) -> Result<Json<PersonResponse>, ApiError> {
    validate_payload(&payload)?;
    let trim = |value: Option<String>| {
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    let updated = repositories::users::update_person(
        state.db(),
        id,
        role,
        repositories::users::UpdatePerson {
            name: trim(payload.name),
            email: trim(payload.email),
            enrollment_number: trim(payload.enrollment_number),
            class_id: trim(payload.class_id),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Email or enrollment number already in use", "Failed to update user")
    })?;
    if !updated {
        return Err(ApiError::NotFound(not_found(role)));
    }

    let person = repositories::users::find_person(state.db(), id, role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or_else(|| ApiError::NotFound(not_found(role)))?;
    Ok(Json(PersonResponse::from_row(person)))
}

async fn delete(state: &AppState, id: &str, role: UserRole) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::users::delete_person(state.db(), id, role)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete user"))?;
    if !deleted {
        return Err(ApiError::NotFound(not_found(role)));
    }
    tracing::info!(user_id = %id, role = role.as_str(), "user deleted");
    Ok(Json(MessageResponse::new("User deleted")))
}

fn not_found(role: UserRole) -> String {
    match role {
        UserRole::Teacher => "Teacher not found".to_string(),
        UserRole::Student => "Student not found".to_string(),
        UserRole::Admin => "User not found".to_string(),
    }
}
