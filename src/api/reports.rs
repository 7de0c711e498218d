use axum::Json;

use crate::api::errors::ApiError;
use crate::api::guards::AuthUser;
use crate::core::state::AppState;
use crate::schemas::submission::SubmissionReportResponse;
use crate::services::submission_report::{self, ReportError};

/// Shared by the teacher and student detail routes.
pub(crate) async fn submission_details(
    state: &AppState,
    submission_id: &str,
    user: &AuthUser,
) -> Result<Json<SubmissionReportResponse>, ApiError> {
    let report = submission_report::load(state.db(), submission_id, &user.id, user.role)
        .await
        .map_err(|err| match err {
            ReportError::NotFound => ApiError::NotFound("Submission not found".to_string()),
            ReportError::Forbidden => ApiError::Forbidden("Access denied"),
            ReportError::Database(err) => ApiError::internal(err, "Failed to load submission details"),
        })?;

    Ok(Json(SubmissionReportResponse::from_report(report)))
}
