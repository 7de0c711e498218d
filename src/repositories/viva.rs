use sqlx::PgPool;

use crate::db::models::{GradingReport, VivaLog, VivaSession};

/// Latest session for the submission; the pipeline writes at most one.
pub(crate) async fn find_session(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<VivaSession>, sqlx::Error> {
    sqlx::query_as::<_, VivaSession>(
        "SELECT id, submission_id, integrity_score, face_match_score, video_url, created_at
         FROM viva_sessions
         WHERE submission_id = $1
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_logs(pool: &PgPool, session_id: &str) -> Result<Vec<VivaLog>, sqlx::Error> {
    sqlx::query_as::<_, VivaLog>(
        "SELECT id, session_id, question_text, transcript, created_at
         FROM viva_logs
         WHERE session_id = $1
         ORDER BY created_at ASC, id",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_report(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<GradingReport>, sqlx::Error> {
    sqlx::query_as::<_, GradingReport>(
        "SELECT id, submission_id, ai_score, feedback_json, created_at
         FROM grading_reports
         WHERE submission_id = $1
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}
