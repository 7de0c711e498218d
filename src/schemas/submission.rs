use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{GradingReport, Submission, VivaLog, VivaSession};
use crate::db::types::SubmissionStatus;
use crate::repositories::submissions::{AssignmentSubmissionRow, StudentHistoryRow};
use crate::services::submission_report::SubmissionReport;

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) file_url: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) final_score: Option<f64>,
    pub(crate) teacher_remarks: Option<String>,
    pub(crate) submitted_at: String,
    pub(crate) teacher_verified_at: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            file_url: submission.file_url,
            status: submission.status,
            final_score: submission.final_score,
            teacher_remarks: submission.teacher_remarks,
            submitted_at: format_primitive(submission.submitted_at),
            teacher_verified_at: submission.teacher_verified_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryResponse {
    #[serde(flatten)]
    pub(crate) submission: SubmissionResponse,
    pub(crate) title: String,
    pub(crate) subject_name: String,
}

impl HistoryResponse {
    pub(crate) fn from_row(row: StudentHistoryRow) -> Self {
        Self {
            submission: SubmissionResponse::from_db(row.submission),
            title: row.title,
            subject_name: row.subject_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentIdentity {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) enrollment_number: String,
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentSubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) file_url: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) final_score: Option<f64>,
    pub(crate) submitted_at: String,
    pub(crate) student: StudentIdentity,
}

impl AssignmentSubmissionResponse {
    pub(crate) fn from_row(row: AssignmentSubmissionRow) -> Self {
        Self {
            id: row.id,
            assignment_id: row.assignment_id,
            file_url: row.file_url,
            status: row.status,
            final_score: row.final_score,
            submitted_at: format_primitive(row.submitted_at),
            student: StudentIdentity {
                id: row.student_id,
                name: row.student_name,
                enrollment_number: row.enrollment_number,
                email: row.email,
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeRequest {
    #[validate(range(min = 0.0, message = "final_score must not be negative"))]
    pub(crate) final_score: f64,
    #[serde(default)]
    pub(crate) teacher_remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VivaSessionResponse {
    pub(crate) id: String,
    pub(crate) integrity_score: Option<f64>,
    pub(crate) face_match_score: Option<f64>,
    pub(crate) video_url: Option<String>,
    pub(crate) created_at: String,
}

impl VivaSessionResponse {
    fn from_db(session: VivaSession) -> Self {
        Self {
            id: session.id,
            integrity_score: session.integrity_score,
            face_match_score: session.face_match_score,
            video_url: session.video_url,
            created_at: format_primitive(session.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VivaLogResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) transcript: Option<String>,
    pub(crate) created_at: String,
}

impl VivaLogResponse {
    fn from_db(log: VivaLog) -> Self {
        Self {
            id: log.id,
            question_text: log.question_text,
            transcript: log.transcript,
            created_at: format_primitive(log.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradingReportResponse {
    pub(crate) id: String,
    pub(crate) ai_score: Option<f64>,
    pub(crate) feedback_json: serde_json::Value,
    pub(crate) created_at: String,
}

impl GradingReportResponse {
    fn from_db(report: GradingReport) -> Self {
        Self {
            id: report.id,
            ai_score: report.ai_score,
            feedback_json: report.feedback_json.0,
            created_at: format_primitive(report.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionReportResponse {
    pub(crate) submission: SubmissionResponse,
    pub(crate) viva_session: Option<VivaSessionResponse>,
    pub(crate) viva_logs: Vec<VivaLogResponse>,
    pub(crate) ai_report: Option<GradingReportResponse>,
}

impl SubmissionReportResponse {
    pub(crate) fn from_report(report: SubmissionReport) -> Self {
        Self {
            submission: SubmissionResponse::from_db(report.submission),
            viva_session: report.viva_session.map(VivaSessionResponse::from_db),
            viva_logs: report.viva_logs.into_iter().map(VivaLogResponse::from_db).collect(),
            ai_report: report.ai_report.map(GradingReportResponse::from_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn submission() -> Submission {
        Submission {
            id: "sub-1".to_string(),
            assignment_id: "asg-1".to_string(),
            student_id: "stu-1".to_string(),
            file_url: "http://localhost:5000/uploads/submission_file-1-a.pdf".to_string(),
            status: SubmissionStatus::Pending,
            final_score: None,
            teacher_remarks: None,
            submitted_at: primitive_now_utc(),
            teacher_verified_at: None,
        }
    }

    #[test]
    fn missing_viva_data_renders_as_null_and_empty() {
        let report = SubmissionReport {
            submission: submission(),
            viva_session: None,
            viva_logs: Vec::new(),
            ai_report: None,
        };

        let value = serde_json::to_value(SubmissionReportResponse::from_report(report)).unwrap();
        assert_eq!(value["submission"]["status"], "PENDING");
        assert!(value["viva_session"].is_null());
        assert_eq!(value["viva_logs"], serde_json::json!([]));
        assert!(value["ai_report"].is_null());
    }

    #[test]
    fn negative_score_fails_validation() {
        let request = GradeRequest { final_score: -1.0, teacher_remarks: None };
        assert!(request.validate().is_err());

        let request = GradeRequest { final_score: 0.0, teacher_remarks: Some("ok".to_string()) };
        assert!(request.validate().is_ok());
    }
}
