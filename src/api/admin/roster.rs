use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::multipart::MultipartForm;
use crate::api::validation::{validate_upload_name, SPREADSHEET_EXTENSIONS};
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::schemas::roster::RosterImportResponse;
use crate::services::roster_import::{self, ImportDefaults, RosterImportError};

pub(super) async fn upload_users(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<RosterImportResponse>, ApiError> {
    let mut form =
        MultipartForm::read(multipart, state.settings().uploads().max_upload_bytes()).await?;

    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::BadRequest("No file uploaded.".to_string()))?;
    validate_upload_name(&file.filename, SPREADSHEET_EXTENSIONS)?;

    let default_role = match non_blank(form.text("default_role")) {
        Some(role) => Some(UserRole::parse(role).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown default_role '{role}'"))
        })?),
        None => None,
    };
    let defaults = ImportDefaults {
        default_role,
        class_id: non_blank(form.text("class_id")).map(str::to_string),
        institute_id: non_blank(form.text("institute_id")).map(str::to_string),
    };

    // workbook parsing is blocking
    let rows = tokio::task::spawn_blocking(move || roster_import::read_workbook(file.bytes))
        .await
        .map_err(|e| ApiError::internal(e, "Roster parsing task failed"))?
        .map_err(import_error)?;

    tracing::info!(admin_id = %admin.id, rows = rows.len(), "roster upload received");
    let summary = roster_import::import(state.db(), &rows, &defaults).await.map_err(import_error)?;

    Ok(Json(RosterImportResponse::from_summary(summary)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn import_error(err: RosterImportError) -> ApiError {
    match err {
        RosterImportError::Database(err) => ApiError::internal(err, "Failed to import roster"),
        other => ApiError::BadRequest(other.to_string()),
    }
}
