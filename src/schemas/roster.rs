use serde::Serialize;

use crate::services::roster_import::ImportSummary;

#[derive(Debug, Serialize)]
pub(crate) struct RosterImportResponse {
    pub(crate) message: String,
    pub(crate) users_processed: usize,
    pub(crate) allocations_made: usize,
    pub(crate) errors: Option<Vec<String>>,
}

impl RosterImportResponse {
    pub(crate) fn from_summary(summary: ImportSummary) -> Self {
        let errors = if summary.errors.is_empty() { None } else { Some(summary.errors) };
        Self {
            message: format!("Processed {} users.", summary.users_processed),
            users_processed: summary.users_processed,
            allocations_made: summary.allocations_made,
            errors,
        }
    }
}
