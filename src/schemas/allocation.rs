use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::repositories::allocations::AllocationRow;
use crate::services::hierarchy::CascadeSelection;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AllocationCreate {
    #[validate(length(min = 1, message = "teacher_id must not be empty"))]
    pub(crate) teacher_id: String,
    #[validate(length(min = 1, message = "subject_id must not be empty"))]
    pub(crate) subject_id: String,
    #[validate(length(min = 1, message = "class_id must not be empty"))]
    pub(crate) class_id: String,
    /// Defaults to the year of the class's semester.
    #[serde(default)]
    pub(crate) academic_year_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocationUpdate {
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    pub(crate) subject_id: Option<String>,
    #[serde(default)]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    pub(crate) academic_year_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllocationQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(flatten)]
    pub(crate) selection: CascadeSelection,
}

#[derive(Debug, Serialize)]
pub(crate) struct AllocationResponse {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) teacher_name: String,
    pub(crate) teacher_enrollment: String,
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) class_id: String,
    pub(crate) class_name: String,
    pub(crate) semester_id: String,
    pub(crate) semester_name: String,
    pub(crate) academic_year_id: String,
    pub(crate) academic_year_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) department_name: Option<String>,
    pub(crate) institute_id: Option<String>,
    pub(crate) institute_name: Option<String>,
    pub(crate) created_at: String,
}

impl AllocationResponse {
    pub(crate) fn from_row(row: AllocationRow) -> Self {
        Self {
            id: row.id,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
            teacher_enrollment: row.teacher_enrollment,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            subject_code: row.subject_code,
            class_id: row.class_id,
            class_name: row.class_name,
            semester_id: row.semester_id,
            semester_name: row.semester_name,
            academic_year_id: row.academic_year_id,
            academic_year_name: row.academic_year_name,
            department_id: row.department_id,
            department_name: row.department_name,
            institute_id: row.institute_id,
            institute_name: row.institute_name,
            created_at: format_primitive(row.created_at),
        }
    }
}

/// Teacher-facing view of an allocation.
#[derive(Debug, Serialize)]
pub(crate) struct TeacherAllocationResponse {
    pub(crate) id: String,
    pub(crate) class_id: String,
    pub(crate) class_name: String,
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) academic_year_id: String,
    pub(crate) academic_year_name: String,
}

impl TeacherAllocationResponse {
    pub(crate) fn from_row(row: AllocationRow) -> Self {
        Self {
            id: row.id,
            class_id: row.class_id,
            class_name: row.class_name,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            subject_code: row.subject_code,
            academic_year_id: row.academic_year_id,
            academic_year_name: row.academic_year_name,
        }
    }
}
