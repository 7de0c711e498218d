use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::multipart::MultipartForm;
use crate::api::reports::submission_details;
use crate::api::validation::{require_text, validate_upload_name};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::repositories;
use crate::schemas::assignment::PendingAssignmentResponse;
use crate::schemas::submission::{HistoryResponse, SubmissionReportResponse, SubmissionResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(pending))
        .route("/history", get(history))
        .route("/submit", post(submit))
        .route("/submissions/:submission_id/details", get(details))
}

async fn pending(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingAssignmentResponse>>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let Some(class_id) = user.class_id else {
        return Ok(Json(Vec::new()));
    };

    let rows = repositories::assignments::pending_for_student(state.db(), &class_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list pending assignments"))?;
    Ok(Json(rows.into_iter().map(PendingAssignmentResponse::from_row).collect()))
}

async fn history(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryResponse>>, ApiError> {
    let rows = repositories::submissions::history_for_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission history"))?;
    Ok(Json(rows.into_iter().map(HistoryResponse::from_row).collect()))
}

async fn submit(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let mut form =
        MultipartForm::read(multipart, state.settings().uploads().max_upload_bytes()).await?;

    let file = form
        .take_file("submission_file")
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let assignment_id = require_text(form.take_text("assignment_id"), "assignment_id")?;

    let assignment = repositories::assignments::find_by_id(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))?;
    let user = repositories::users::find_by_id(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;
    if user.class_id.as_deref() != Some(assignment.class_id.as_str()) {
        return Err(ApiError::Forbidden("This assignment is not for your class"));
    }

    let extension = validate_upload_name(
        &file.filename,
        state.settings().uploads().allowed_extensions.as_slice(),
    )?;
    let stored = state
        .uploads()
        .save("submission_file", &extension, &file.bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store submission file"))?;

    let created = repositories::submissions::create(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &assignment.id,
            student_id: &user.id,
            file_url: &stored.url,
            submitted_at: primitive_now_utc(),
        },
    )
    .await;

    let submission = match created {
        Ok(submission) => submission,
        Err(err) => {
            state.uploads().discard(&stored).await;
            if db::is_unique_violation(&err) {
                return Err(ApiError::Conflict(
                    "You have already submitted this assignment".to_string(),
                ));
            }
            return Err(ApiError::internal(err, "Failed to create submission"));
        }
    };

    metrics::counter!("submissions_received_total").increment(1);
    tracing::info!(submission_id = %submission.id, student_id = %user.id, "submission received");
    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission))))
}

async fn details(
    CurrentStudent(student): CurrentStudent,
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionReportResponse>, ApiError> {
    submission_details(&state, &submission_id, &student).await
}

#[cfg(test)]
mod tests;
