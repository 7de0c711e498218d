use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{GradingReport, Submission, VivaLog, VivaSession};
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::submissions::SubmissionOwnership;

#[derive(Debug, Error)]
pub(crate) enum ReportError {
    #[error("submission not found")]
    NotFound,
    #[error("submission belongs to someone else")]
    Forbidden,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A submission together with everything the viva pipeline recorded for it.
#[derive(Debug, Clone)]
pub(crate) struct SubmissionReport {
    pub(crate) submission: Submission,
    pub(crate) viva_session: Option<VivaSession>,
    pub(crate) viva_logs: Vec<VivaLog>,
    pub(crate) ai_report: Option<GradingReport>,
}

/// Students read their own submissions, teachers those on their assignments,
/// admins everything.
pub(crate) fn authorize(
    ownership: &SubmissionOwnership,
    user_id: &str,
    role: UserRole,
) -> Result<(), ReportError> {
    let allowed = match role {
        UserRole::Admin => true,
        UserRole::Teacher => ownership.teacher_id == user_id,
        UserRole::Student => ownership.student_id == user_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(ReportError::Forbidden)
    }
}

/// Ownership is checked before any report data is read.
pub(crate) async fn load(
    pool: &PgPool,
    submission_id: &str,
    user_id: &str,
    role: UserRole,
) -> Result<SubmissionReport, ReportError> {
    let ownership = repositories::submissions::find_ownership(pool, submission_id)
        .await?
        .ok_or(ReportError::NotFound)?;
    authorize(&ownership, user_id, role)?;

    let submission = repositories::submissions::find_by_id(pool, submission_id)
        .await?
        .ok_or(ReportError::NotFound)?;

    let viva_session = repositories::viva::find_session(pool, submission_id).await?;
    let viva_logs = match &viva_session {
        Some(session) => repositories::viva::list_logs(pool, &session.id).await?,
        None => Vec::new(),
    };
    let ai_report = repositories::viva::find_report(pool, submission_id).await?;

    Ok(SubmissionReport { submission, viva_session, viva_logs, ai_report })
}
