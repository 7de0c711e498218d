use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LookupRequest {
    #[serde(alias = "enrollmentNumber")]
    #[validate(length(min = 1, message = "enrollment_number must not be empty"))]
    pub(crate) enrollment_number: String,
}

/// Used for both signup and login.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CredentialsRequest {
    #[serde(alias = "enrollmentNumber")]
    #[validate(length(min = 1, message = "enrollment_number must not be empty"))]
    pub(crate) enrollment_number: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LookupResponse {
    pub(crate) message: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    pub(crate) token: String,
    pub(crate) role: UserRole,
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MeResponse {
    pub(crate) id: String,
    pub(crate) role: UserRole,
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct FaceUploadResponse {
    pub(crate) message: String,
    pub(crate) data: FaceImageData,
}

#[derive(Debug, Serialize)]
pub(crate) struct FaceImageData {
    pub(crate) name: String,
    pub(crate) face_image_url: String,
}
