use std::path::Path;

use time::{Date, PrimitiveDateTime};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::time::{parse_date, parse_datetime};
use crate::db::models::AcademicYear;

pub(crate) const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "ods"];
pub(crate) const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Returns the lowercased extension when it is on the allow list.
pub(crate) fn validate_upload_name<S: AsRef<str>>(
    filename: &str,
    allowed: &[S],
) -> Result<String, ApiError> {
    let extension = file_extension(filename)
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if allowed.iter().any(|candidate| candidate.as_ref() == extension) {
        Ok(extension)
    } else {
        Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")))
    }
}

pub(crate) fn require_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

pub(crate) fn parse_date_field(value: &str, field: &str) -> Result<Date, ApiError> {
    parse_date(value)
        .ok_or_else(|| ApiError::BadRequest(format!("{field} must be a date (YYYY-MM-DD)")))
}

pub(crate) fn parse_optional_date(value: Option<&str>, field: &str) -> Result<Option<Date>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_date_field(value, field).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn parse_deadline(value: &str) -> Result<PrimitiveDateTime, ApiError> {
    parse_datetime(value).ok_or_else(|| {
        ApiError::BadRequest("deadline must be an RFC 3339 or YYYY-MM-DDTHH:MM datetime".to_string())
    })
}

pub(crate) fn ensure_date_order(start: Option<Date>, end: Option<Date>) -> Result<(), ApiError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(ApiError::BadRequest("start_date must not be after end_date".to_string()))
        }
        _ => Ok(()),
    }
}

/// Semester dates must fall inside the academic year.
pub(crate) fn ensure_within_year(
    year: &AcademicYear,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<(), ApiError> {
    ensure_date_order(start, end)?;
    let outside = |date: Date| date < year.start_date || date > year.end_date;
    if start.is_some_and(outside) || end.is_some_and(outside) {
        return Err(ApiError::BadRequest(format!(
            "Semester dates must lie within the academic year ({} to {})",
            year.start_date, year.end_date
        )));
    }
    Ok(())
}
