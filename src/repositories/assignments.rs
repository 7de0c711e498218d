use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Assignment;

const COLUMNS: &str = "\
    id, title, description, question_file_url, solution_file_url, deadline, \
    class_id, subject_id, teacher_id, created_at";

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TeacherAssignmentRow {
    #[sqlx(flatten)]
    pub(crate) assignment: Assignment,
    pub(crate) class_name: String,
    pub(crate) subject_name: String,
    pub(crate) submission_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct PendingAssignmentRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_file_url: Option<String>,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) teacher_name: String,
}

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) question_file_url: Option<&'a str>,
    pub(crate) solution_file_url: Option<&'a str>,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) class_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, title, description, question_file_url, solution_file_url, deadline,
            class_id, subject_id, teacher_id, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.question_file_url)
    .bind(params.solution_file_url)
    .bind(params.deadline)
    .bind(params.class_id)
    .bind(params.subject_id)
    .bind(params.teacher_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_teacher(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<Vec<TeacherAssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, TeacherAssignmentRow>(
        "SELECT a.id, a.title, a.description, a.question_file_url, a.solution_file_url,
                a.deadline, a.class_id, a.subject_id, a.teacher_id, a.created_at,
                c.name AS class_name, s.name AS subject_name,
                (SELECT COUNT(*) FROM submissions sub WHERE sub.assignment_id = a.id)
                    AS submission_count
         FROM assignments a
         JOIN classes c ON c.id = a.class_id
         JOIN subjects s ON s.id = a.subject_id
         WHERE a.teacher_id = $1
         ORDER BY a.created_at DESC",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

/// Assignments of the class the student has not submitted yet, soonest
/// deadline first.
pub(crate) async fn pending_for_student(
    pool: &PgPool,
    class_id: &str,
    student_id: &str,
) -> Result<Vec<PendingAssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, PendingAssignmentRow>(
        "SELECT a.id, a.title, a.description, a.question_file_url, a.deadline,
                s.name AS subject_name, s.code AS subject_code, t.name AS teacher_name
         FROM assignments a
         JOIN subjects s ON s.id = a.subject_id
         JOIN users t ON t.id = a.teacher_id
         WHERE a.class_id = $1
           AND NOT EXISTS (
               SELECT 1 FROM submissions sub
               WHERE sub.assignment_id = a.id AND sub.student_id = $2
           )
         ORDER BY a.deadline ASC, a.id",
    )
    .bind(class_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}
