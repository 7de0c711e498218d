use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

const REQUIRED_COLUMNS: [&str; 3] = ["name", "email", "enrollment_number"];

#[derive(Debug, Error)]
pub(crate) enum RosterImportError {
    #[error("unable to read spreadsheet: {0}")]
    Workbook(String),
    #[error("spreadsheet has no worksheet")]
    NoWorksheet,
    #[error("spreadsheet is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// One data row of the sheet. `line` is the 1-based spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RosterRow {
    pub(crate) line: usize,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) enrollment_number: String,
    pub(crate) role: Option<String>,
    pub(crate) class_name: Option<String>,
    pub(crate) subject_code: Option<String>,
}

/// Form fields sent alongside the file.
#[derive(Debug, Clone, Default)]
pub(crate) struct ImportDefaults {
    pub(crate) default_role: Option<UserRole>,
    pub(crate) class_id: Option<String>,
    pub(crate) institute_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassRef {
    pub(crate) class_id: String,
    pub(crate) academic_year_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassMatch {
    Unique(ClassRef),
    Ambiguous,
}

/// Class names and subject codes keyed by their lowercased, trimmed value.
#[derive(Debug, Clone, Default)]
pub(crate) struct LookupMaps {
    classes: HashMap<String, ClassMatch>,
    subjects: HashMap<String, String>,
}

#[derive(Debug, FromRow)]
struct ClassLookupRow {
    id: String,
    name: String,
    academic_year_id: String,
}

impl LookupMaps {
    pub(crate) fn new(
        classes: impl IntoIterator<Item = (String, ClassRef)>,
        subjects: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut class_map: HashMap<String, ClassMatch> = HashMap::new();
        for (name, class_ref) in classes {
            class_map
                .entry(lookup_key(&name))
                .and_modify(|existing| *existing = ClassMatch::Ambiguous)
                .or_insert(ClassMatch::Unique(class_ref));
        }

        let subjects = subjects.into_iter().map(|(code, id)| (lookup_key(&code), id)).collect();
        Self { classes: class_map, subjects }
    }

    pub(crate) async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let classes = sqlx::query_as::<_, ClassLookupRow>(
            "SELECT c.id, c.name, s.academic_year_id
             FROM classes c
             JOIN semesters s ON s.id = c.semester_id",
        )
        .fetch_all(pool)
        .await?;
        let subjects = sqlx::query_as::<_, (String, String)>("SELECT code, id FROM subjects")
            .fetch_all(pool)
            .await?;

        Ok(Self::new(
            classes.into_iter().map(|row| {
                (row.name, ClassRef { class_id: row.id, academic_year_id: row.academic_year_id })
            }),
            subjects,
        ))
    }

    fn class(&self, name: &str) -> Option<&ClassMatch> {
        self.classes.get(&lookup_key(name))
    }

    fn subject(&self, code: &str) -> Option<&str> {
        self.subjects.get(&lookup_key(code)).map(String::as_str)
    }
}

fn lookup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedAllocation {
    pub(crate) subject_id: String,
    pub(crate) class_id: String,
    pub(crate) academic_year_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedUser {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) enrollment_number: String,
    pub(crate) role: UserRole,
    pub(crate) class_id: Option<String>,
    pub(crate) allocation: Option<PlannedAllocation>,
    pub(crate) warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowPlan {
    Import(PlannedUser),
    Skip(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub(crate) users_processed: usize,
    pub(crate) allocations_made: usize,
    pub(crate) errors: Vec<String>,
}

/// Reads the first worksheet of an xlsx/xls/ods file.
pub(crate) fn read_workbook(bytes: Vec<u8>) -> Result<Vec<RosterRow>, RosterImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| RosterImportError::Workbook(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(RosterImportError::NoWorksheet)?
        .map_err(|err| RosterImportError::Workbook(err.to_string()))?;

    let cells = range.rows().map(|row| row.iter().map(cell_text).collect()).collect();
    rows_from_cells(cells)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.trim().to_string(),
        // enrollment numbers typed as numbers come back as floats
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string().trim().to_string(),
    }
}

/// Maps a header row plus data rows into roster rows. Header names are matched
/// case-insensitively; spaces are read as underscores. Blank rows are dropped.
pub(crate) fn rows_from_cells(cells: Vec<Vec<String>>) -> Result<Vec<RosterRow>, RosterImportError> {
    let mut rows = cells.into_iter();
    let Some(header) = rows.next() else {
        return Err(RosterImportError::MissingColumn(REQUIRED_COLUMNS[0]));
    };

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(index, title)| (title.trim().to_lowercase().replace(' ', "_"), index))
        .collect();

    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(required) {
            return Err(RosterImportError::MissingColumn(required));
        }
    }

    let column = |row: &[String], name: &str| -> Option<String> {
        columns
            .get(name)
            .and_then(|index| row.get(*index))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let parsed = rows
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|(index, row)| RosterRow {
            line: index + 2,
            name: column(&row, "name").unwrap_or_default(),
            email: column(&row, "email").unwrap_or_default(),
            enrollment_number: column(&row, "enrollment_number").unwrap_or_default(),
            role: column(&row, "role"),
            class_name: column(&row, "class_name"),
            subject_code: column(&row, "subject_code"),
        })
        .collect();

    Ok(parsed)
}

/// Decides what to do with one row without touching the database.
pub(crate) fn plan_row(row: &RosterRow, defaults: &ImportDefaults, maps: &LookupMaps) -> RowPlan {
    let role = match row.role.as_deref() {
        Some(raw) => match UserRole::parse(raw) {
            Some(role) => role,
            None => return RowPlan::Skip(format!("unknown role '{raw}'")),
        },
        None => defaults.default_role.unwrap_or(UserRole::Student),
    };

    if role == UserRole::Admin {
        return RowPlan::Skip("admin accounts cannot be imported".to_string());
    }
    if row.email.is_empty() || row.enrollment_number.is_empty() {
        return RowPlan::Skip("missing email or enrollment_number".to_string());
    }

    let name = if row.name.is_empty() { row.enrollment_number.clone() } else { row.name.clone() };
    let resolved_class = row.class_name.as_deref().map(|class_name| (class_name, maps.class(class_name)));

    match role {
        UserRole::Student => {
            let class_id = match resolved_class {
                Some((_, Some(ClassMatch::Unique(class_ref)))) => class_ref.class_id.clone(),
                Some((class_name, Some(ClassMatch::Ambiguous))) => {
                    return RowPlan::Skip(format!("class '{class_name}' is ambiguous"));
                }
                Some((class_name, None)) => {
                    return RowPlan::Skip(format!("class '{class_name}' not found"));
                }
                None => match &defaults.class_id {
                    Some(class_id) => class_id.clone(),
                    None => return RowPlan::Skip("student requires a target class".to_string()),
                },
            };

            RowPlan::Import(PlannedUser {
                name,
                email: row.email.clone(),
                enrollment_number: row.enrollment_number.clone(),
                role,
                class_id: Some(class_id),
                allocation: None,
                warning: None,
            })
        }
        _ => {
            let subject = row.subject_code.as_deref().map(|code| (code, maps.subject(code)));
            let (allocation, warning) = match (resolved_class, subject) {
                (None, None) => (None, None),
                (Some((_, Some(ClassMatch::Unique(class_ref)))), Some((_, Some(subject_id)))) => (
                    Some(PlannedAllocation {
                        subject_id: subject_id.to_string(),
                        class_id: class_ref.class_id.clone(),
                        academic_year_id: class_ref.academic_year_id.clone(),
                    }),
                    None,
                ),
                (class, subject) => (None, Some(teacher_warning(class, subject))),
            };

            RowPlan::Import(PlannedUser {
                name,
                email: row.email.clone(),
                enrollment_number: row.enrollment_number.clone(),
                role,
                class_id: None,
                allocation,
                warning,
            })
        }
    }
}

fn teacher_warning(
    class: Option<(&str, Option<&ClassMatch>)>,
    subject: Option<(&str, Option<&str>)>,
) -> String {
    let class_problem = match class {
        None => Some("no class_name".to_string()),
        Some((name, None)) => Some(format!("class '{name}' not found")),
        Some((name, Some(ClassMatch::Ambiguous))) => Some(format!("class '{name}' is ambiguous")),
        Some((_, Some(ClassMatch::Unique(_)))) => None,
    };
    let subject_problem = match subject {
        None => Some("no subject_code".to_string()),
        Some((code, None)) => Some(format!("subject '{code}' not found")),
        Some((_, Some(_))) => None,
    };

    let reasons: Vec<String> = class_problem.into_iter().chain(subject_problem).collect();
    format!("imported without allocation ({})", reasons.join(", "))
}

/// Upserts every plannable row and records per-row failures without
/// aborting the batch.
pub(crate) async fn import(
    pool: &PgPool,
    rows: &[RosterRow],
    defaults: &ImportDefaults,
) -> Result<ImportSummary, RosterImportError> {
    let maps = LookupMaps::load(pool).await?;
    let mut summary = ImportSummary::default();

    for row in rows {
        let planned = match plan_row(row, defaults, &maps) {
            RowPlan::Import(planned) => planned,
            RowPlan::Skip(reason) => {
                metrics::counter!("roster_rows_total", "outcome" => "skipped").increment(1);
                summary.errors.push(format!("Row {}: {reason}", row.line));
                continue;
            }
        };

        if let Some(warning) = &planned.warning {
            summary.errors.push(format!("Row {}: {warning}", row.line));
        }

        match store_row(pool, &planned, defaults).await {
            Ok(StoredRow::Stored { allocated }) => {
                metrics::counter!("roster_rows_total", "outcome" => "imported").increment(1);
                summary.users_processed += 1;
                if allocated {
                    summary.allocations_made += 1;
                }
            }
            Ok(StoredRow::AdminAccount) => {
                metrics::counter!("roster_rows_total", "outcome" => "skipped").increment(1);
                summary.errors.push(format!(
                    "Row {}: enrollment number belongs to an admin account",
                    row.line
                ));
            }
            Err(err) => {
                metrics::counter!("roster_rows_total", "outcome" => "failed").increment(1);
                tracing::warn!(
                    line = row.line,
                    enrollment = %planned.enrollment_number,
                    error = %err,
                    "roster row failed"
                );
                summary.errors.push(format!("Row {}: {}", row.line, describe_db_error(&err)));
            }
        }
    }

    tracing::info!(
        users = summary.users_processed,
        allocations = summary.allocations_made,
        problems = summary.errors.len(),
        "roster import finished"
    );
    Ok(summary)
}

enum StoredRow {
    Stored { allocated: bool },
    AdminAccount,
}

async fn store_row(
    pool: &PgPool,
    planned: &PlannedUser,
    defaults: &ImportDefaults,
) -> Result<StoredRow, sqlx::Error> {
    let now = primitive_now_utc();
    let candidate_id = Uuid::new_v4().to_string();
    let user_id = repositories::users::upsert_roster_user(
        pool,
        repositories::users::RosterUser {
            id: &candidate_id,
            name: &planned.name,
            email: &planned.email,
            enrollment_number: &planned.enrollment_number,
            role: planned.role,
            class_id: planned.class_id.as_deref(),
            institute_id: defaults.institute_id.as_deref(),
            now,
        },
    )
    .await?;

    let Some(user_id) = user_id else {
        return Ok(StoredRow::AdminAccount);
    };
    let Some(allocation) = &planned.allocation else {
        return Ok(StoredRow::Stored { allocated: false });
    };

    let allocation_id = Uuid::new_v4().to_string();
    let allocated = repositories::allocations::ensure(
        pool,
        repositories::allocations::CreateAllocation {
            id: &allocation_id,
            teacher_id: &user_id,
            subject_id: &allocation.subject_id,
            class_id: &allocation.class_id,
            academic_year_id: &allocation.academic_year_id,
            created_at: now,
        },
    )
    .await?;
    Ok(StoredRow::Stored { allocated })
}

fn describe_db_error(err: &sqlx::Error) -> String {
    if crate::db::is_unique_violation(err) {
        "email already belongs to another account".to_string()
    } else if crate::db::is_foreign_key_violation(err) {
        "referenced class or institute does not exist".to_string()
    } else {
        "database error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|row| row.iter().map(|cell| cell.to_string()).collect()).collect()
    }

    fn maps() -> LookupMaps {
        LookupMaps::new(
            vec![
                ("CS-A".to_string(), class_ref("c1", "y1")),
                ("Physics".to_string(), class_ref("c2", "y1")),
                ("physics ".to_string(), class_ref("c3", "y2")),
            ],
            vec![("CS101".to_string(), "sub-1".to_string())],
        )
    }

    fn class_ref(class_id: &str, year: &str) -> ClassRef {
        ClassRef { class_id: class_id.to_string(), academic_year_id: year.to_string() }
    }

    fn row(role: Option<&str>, class_name: Option<&str>, subject_code: Option<&str>) -> RosterRow {
        RosterRow {
            line: 2,
            name: "Ada".to_string(),
            email: "ada@example.edu".to_string(),
            enrollment_number: "E100".to_string(),
            role: role.map(str::to_string),
            class_name: class_name.map(str::to_string),
            subject_code: subject_code.map(str::to_string),
        }
    }

    #[test]
    fn header_is_matched_case_insensitively_and_blank_rows_dropped() {
        let parsed = rows_from_cells(cells(&[
            &["Name", "EMAIL", "Enrollment Number", "Role", "class_name"],
            &["Ada", "ada@example.edu", "E1", "student", "CS-A"],
            &["", "", "", "", ""],
            &["Alan", "alan@example.edu", "T1", "TEACHER", ""],
        ]))
        .expect("rows");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].line, 2);
        assert_eq!(parsed[0].class_name.as_deref(), Some("CS-A"));
        assert_eq!(parsed[1].line, 4);
        assert_eq!(parsed[1].role.as_deref(), Some("TEACHER"));
        assert_eq!(parsed[1].class_name, None);
        assert_eq!(parsed[1].subject_code, None);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = rows_from_cells(cells(&[&["name", "email"], &["Ada", "a@x"]]))
            .expect_err("enrollment column missing");
        assert!(matches!(err, RosterImportError::MissingColumn("enrollment_number")));
    }

    #[test]
    fn whole_float_cells_render_as_integers() {
        assert_eq!(cell_text(&Data::Float(2021001.0)), "2021001");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::String("  E7 ".to_string())), "E7");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn student_resolves_class_by_name() {
        let plan = plan_row(&row(None, Some("cs-a"), None), &ImportDefaults::default(), &maps());
        let RowPlan::Import(user) = plan else { panic!("expected import") };
        assert_eq!(user.role, UserRole::Student);
        assert_eq!(user.class_id.as_deref(), Some("c1"));
        assert!(user.allocation.is_none());
    }

    #[test]
    fn student_without_any_class_is_skipped() {
        let plan = plan_row(&row(Some("student"), None, None), &ImportDefaults::default(), &maps());
        assert_eq!(plan, RowPlan::Skip("student requires a target class".to_string()));

        let defaults =
            ImportDefaults { class_id: Some("c9".to_string()), ..ImportDefaults::default() };
        let RowPlan::Import(user) = plan_row(&row(None, None, None), &defaults, &maps()) else {
            panic!("default class applies");
        };
        assert_eq!(user.class_id.as_deref(), Some("c9"));
    }

    #[test]
    fn unknown_and_ambiguous_classes_skip_students() {
        let defaults = ImportDefaults::default();
        assert_eq!(
            plan_row(&row(None, Some("Biology"), None), &defaults, &maps()),
            RowPlan::Skip("class 'Biology' not found".to_string())
        );
        assert_eq!(
            plan_row(&row(None, Some("PHYSICS"), None), &defaults, &maps()),
            RowPlan::Skip("class 'PHYSICS' is ambiguous".to_string())
        );
    }

    #[test]
    fn teacher_with_class_and_subject_gets_allocation() {
        let plan = plan_row(&row(Some("Teacher"), Some("CS-A"), Some("cs101")), &ImportDefaults::default(), &maps());
        let RowPlan::Import(user) = plan else { panic!("expected import") };
        assert_eq!(user.class_id, None);
        assert_eq!(
            user.allocation,
            Some(PlannedAllocation {
                subject_id: "sub-1".to_string(),
                class_id: "c1".to_string(),
                academic_year_id: "y1".to_string(),
            })
        );
        assert_eq!(user.warning, None);
    }

    #[test]
    fn partially_resolvable_teacher_is_imported_with_warning() {
        let plan = plan_row(&row(Some("TEACHER"), Some("CS-A"), Some("XX9")), &ImportDefaults::default(), &maps());
        let RowPlan::Import(user) = plan else { panic!("expected import") };
        assert!(user.allocation.is_none());
        assert_eq!(
            user.warning.as_deref(),
            Some("imported without allocation (subject 'XX9' not found)")
        );

        let plan = plan_row(&row(Some("TEACHER"), None, None), &ImportDefaults::default(), &maps());
        let RowPlan::Import(user) = plan else { panic!("expected import") };
        assert_eq!(user.warning, None);
    }

    #[test]
    fn role_column_overrides_default_and_rejects_unknown() {
        let defaults =
            ImportDefaults { default_role: Some(UserRole::Teacher), ..ImportDefaults::default() };
        let RowPlan::Import(user) = plan_row(&row(None, None, None), &defaults, &maps()) else {
            panic!("teacher by default");
        };
        assert_eq!(user.role, UserRole::Teacher);

        assert_eq!(
            plan_row(&row(Some("dean"), None, None), &defaults, &maps()),
            RowPlan::Skip("unknown role 'dean'".to_string())
        );
        assert_eq!(
            plan_row(&row(Some("admin"), None, None), &defaults, &maps()),
            RowPlan::Skip("admin accounts cannot be imported".to_string())
        );
    }

    #[test]
    fn rows_without_identity_are_skipped() {
        let mut incomplete = row(Some("TEACHER"), None, None);
        incomplete.email.clear();
        assert_eq!(
            plan_row(&incomplete, &ImportDefaults::default(), &maps()),
            RowPlan::Skip("missing email or enrollment_number".to_string())
        );
    }
}
