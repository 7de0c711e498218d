use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::Subject;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubjectCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) institute_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) institute_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) institute_id: Option<String>,
}

impl SubjectResponse {
    pub(crate) fn from_db(subject: &Subject) -> Self {
        Self {
            id: subject.id.clone(),
            name: subject.name.clone(),
            code: subject.code.clone(),
            institute_id: subject.institute_id.clone(),
        }
    }
}
