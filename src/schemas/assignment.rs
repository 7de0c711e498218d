use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Assignment;
use crate::repositories::assignments::{PendingAssignmentRow, TeacherAssignmentRow};

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_file_url: Option<String>,
    pub(crate) solution_file_url: Option<String>,
    pub(crate) deadline: String,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) created_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            title: assignment.title,
            description: assignment.description,
            question_file_url: assignment.question_file_url,
            solution_file_url: assignment.solution_file_url,
            deadline: format_primitive(assignment.deadline),
            class_id: assignment.class_id,
            subject_id: assignment.subject_id,
            teacher_id: assignment.teacher_id,
            created_at: format_primitive(assignment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherAssignmentResponse {
    #[serde(flatten)]
    pub(crate) assignment: AssignmentResponse,
    pub(crate) class_name: String,
    pub(crate) subject_name: String,
    pub(crate) submission_count: i64,
}

impl TeacherAssignmentResponse {
    pub(crate) fn from_row(row: TeacherAssignmentRow) -> Self {
        Self {
            assignment: AssignmentResponse::from_db(row.assignment),
            class_name: row.class_name,
            subject_name: row.subject_name,
            submission_count: row.submission_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PendingAssignmentResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_file_url: Option<String>,
    pub(crate) deadline: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) teacher_name: String,
}

impl PendingAssignmentResponse {
    pub(crate) fn from_row(row: PendingAssignmentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            question_file_url: row.question_file_url,
            deadline: format_primitive(row.deadline),
            subject_name: row.subject_name,
            subject_code: row.subject_code,
            teacher_name: row.teacher_name,
        }
    }
}
