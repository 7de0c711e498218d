pub(crate) mod hierarchy;
pub(crate) mod roster_import;
pub(crate) mod storage;
pub(crate) mod submission_report;
