use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{SemesterType, SubmissionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Institute {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Department {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) institute_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AcademicYear {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) department_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Semester {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) semester_type: SemesterType,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
    pub(crate) academic_year_id: String,
    pub(crate) department_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Class {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) semester_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Subject {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) code: String,
    pub(crate) institute_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) enrollment_number: String,
    pub(crate) role: UserRole,
    pub(crate) password_hash: Option<String>,
    pub(crate) face_image_url: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) institute_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_activated(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubjectAllocation {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) subject_id: String,
    pub(crate) class_id: String,
    pub(crate) academic_year_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_file_url: Option<String>,
    pub(crate) solution_file_url: Option<String>,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) class_id: String,
    pub(crate) subject_id: String,
    pub(crate) teacher_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) file_url: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) final_score: Option<f64>,
    pub(crate) teacher_remarks: Option<String>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) teacher_verified_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct VivaSession {
    pub(crate) id: String,
    pub(crate) submission_id: String,
    pub(crate) integrity_score: Option<f64>,
    pub(crate) face_match_score: Option<f64>,
    pub(crate) video_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct VivaLog {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) question_text: String,
    pub(crate) transcript: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct GradingReport {
    pub(crate) id: String,
    pub(crate) submission_id: String,
    pub(crate) ai_score: Option<f64>,
    pub(crate) feedback_json: Json<serde_json::Value>,
    pub(crate) created_at: PrimitiveDateTime,
}
