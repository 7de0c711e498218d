use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::UserRole;
use crate::repositories::users::PersonRow;

#[derive(Debug, Serialize)]
pub(crate) struct PersonResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) enrollment_number: String,
    pub(crate) role: UserRole,
    pub(crate) class_id: Option<String>,
    pub(crate) class_name: Option<String>,
    pub(crate) institute_id: Option<String>,
    pub(crate) face_image_url: Option<String>,
    pub(crate) is_activated: bool,
}

impl PersonResponse {
    pub(crate) fn from_row(row: PersonRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            enrollment_number: row.enrollment_number,
            role: row.role,
            class_id: row.class_id,
            class_name: row.class_name,
            institute_id: row.institute_id,
            face_image_url: row.face_image_url,
            is_activated: row.is_activated,
        }
    }
}

/// Subset shown to teachers listing a class.
#[derive(Debug, Serialize)]
pub(crate) struct ClassStudentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) enrollment_number: String,
    pub(crate) email: String,
}

impl ClassStudentResponse {
    pub(crate) fn from_row(row: PersonRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            enrollment_number: row.enrollment_number,
            email: row.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct PersonUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "email is invalid"))]
    pub(crate) email: Option<String>,
    #[serde(default, alias = "enrollmentNumber")]
    #[validate(length(min = 1, message = "enrollment_number must not be empty"))]
    pub(crate) enrollment_number: Option<String>,
    #[serde(default)]
    pub(crate) class_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentQuery {
    #[serde(default)]
    pub(crate) class_id: Option<String>,
}
