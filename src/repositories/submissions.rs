use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Submission;
use crate::db::types::SubmissionStatus;

pub(crate) const COLUMNS: &str = "\
    id, assignment_id, student_id, file_url, status, final_score, teacher_remarks, \
    submitted_at, teacher_verified_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct StudentHistoryRow {
    #[sqlx(flatten)]
    pub(crate) submission: Submission,
    pub(crate) title: String,
    pub(crate) subject_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct AssignmentSubmissionRow {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) file_url: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) final_score: Option<f64>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) enrollment_number: String,
    pub(crate) email: String,
}

/// Who may see a submission: the student who made it and the teacher who
/// set the assignment.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SubmissionOwnership {
    pub(crate) student_id: String,
    pub(crate) teacher_id: String,
}

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) file_url: &'a str,
    pub(crate) submitted_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (id, assignment_id, student_id, file_url, status, submitted_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.assignment_id)
    .bind(params.student_id)
    .bind(params.file_url)
    .bind(SubmissionStatus::Pending)
    .bind(params.submitted_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!("SELECT {COLUMNS} FROM submissions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_ownership(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SubmissionOwnership>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionOwnership>(
        "SELECT s.student_id, a.teacher_id
         FROM submissions s
         JOIN assignments a ON a.id = s.assignment_id
         WHERE s.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn history_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<StudentHistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentHistoryRow>(
        "SELECT s.id, s.assignment_id, s.student_id, s.file_url, s.status, s.final_score,
                s.teacher_remarks, s.submitted_at, s.teacher_verified_at,
                a.title, sub.name AS subject_name
         FROM submissions s
         JOIN assignments a ON a.id = s.assignment_id
         JOIN subjects sub ON sub.id = a.subject_id
         WHERE s.student_id = $1
         ORDER BY s.submitted_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_assignment(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<Vec<AssignmentSubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmissionRow>(
        "SELECT s.id, s.assignment_id, s.file_url, s.status, s.final_score, s.submitted_at,
                u.id AS student_id, u.name AS student_name, u.enrollment_number, u.email
         FROM submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.assignment_id = $1
         ORDER BY s.submitted_at DESC",
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn grade(
    pool: &PgPool,
    id: &str,
    final_score: f64,
    teacher_remarks: Option<&str>,
    verified_at: PrimitiveDateTime,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "UPDATE submissions SET
            final_score = $1,
            teacher_remarks = $2,
            status = $3,
            teacher_verified_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(final_score)
    .bind(teacher_remarks)
    .bind(SubmissionStatus::TeacherVerified)
    .bind(verified_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}
