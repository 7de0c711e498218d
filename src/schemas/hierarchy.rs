use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{AcademicYear, Class, Department, Institute, Semester};
use crate::db::types::SemesterType;
use crate::services::hierarchy::{CascadeSelection, LevelOptions};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct InstitutePayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InstituteResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) created_at: String,
}

impl InstituteResponse {
    pub(crate) fn from_db(institute: &Institute) -> Self {
        Self {
            id: institute.id.clone(),
            name: institute.name.clone(),
            created_at: format_primitive(institute.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct DepartmentCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "institute_id must not be empty"))]
    pub(crate) institute_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) institute_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentQuery {
    #[serde(default)]
    pub(crate) institute_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) institute_id: String,
    pub(crate) created_at: String,
}

impl DepartmentResponse {
    pub(crate) fn from_db(department: &Department) -> Self {
        Self {
            id: department.id.clone(),
            name: department.name.clone(),
            institute_id: department.institute_id.clone(),
            created_at: format_primitive(department.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AcademicYearCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    /// Absent or empty for an institution-wide year.
    #[serde(default)]
    pub(crate) department_id: Option<String>,
    #[serde(default)]
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcademicYearUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) start_date: Option<String>,
    #[serde(default)]
    pub(crate) end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcademicYearQuery {
    #[serde(default)]
    pub(crate) department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    pub(crate) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AcademicYearResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) department_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl AcademicYearResponse {
    pub(crate) fn from_db(year: &AcademicYear) -> Self {
        Self {
            id: year.id.clone(),
            name: year.name.clone(),
            start_date: format_date(year.start_date),
            end_date: format_date(year.end_date),
            department_id: year.department_id.clone(),
            is_active: year.is_active,
            created_at: format_primitive(year.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SemesterCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(rename = "type", alias = "semester_type")]
    pub(crate) semester_type: SemesterType,
    #[serde(alias = "year_id")]
    #[validate(length(min = 1, message = "academic_year_id must not be empty"))]
    pub(crate) academic_year_id: String,
    #[serde(default)]
    pub(crate) start_date: Option<String>,
    #[serde(default)]
    pub(crate) end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SemesterUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default, rename = "type", alias = "semester_type")]
    pub(crate) semester_type: Option<SemesterType>,
    #[serde(default)]
    pub(crate) start_date: Option<String>,
    #[serde(default)]
    pub(crate) end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SemesterQuery {
    #[serde(default, alias = "yearId", alias = "academic_year_id")]
    pub(crate) year_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SemesterResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) semester_type: SemesterType,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
    pub(crate) academic_year_id: String,
    pub(crate) department_id: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl SemesterResponse {
    pub(crate) fn from_db(semester: &Semester) -> Self {
        Self {
            id: semester.id.clone(),
            name: semester.name.clone(),
            semester_type: semester.semester_type,
            start_date: semester.start_date.map(format_date),
            end_date: semester.end_date.map(format_date),
            academic_year_id: semester.academic_year_id.clone(),
            department_id: semester.department_id.clone(),
            is_active: semester.is_active,
            created_at: format_primitive(semester.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "semester_id must not be empty"))]
    pub(crate) semester_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) semester_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassQuery {
    #[serde(default)]
    pub(crate) semester_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) semester_id: String,
    pub(crate) created_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(class: &Class) -> Self {
        Self {
            id: class.id.clone(),
            name: class.name.clone(),
            semester_id: class.semester_id.clone(),
            created_at: format_primitive(class.created_at),
        }
    }
}

/// Sanitised selection plus the options of every level.
#[derive(Debug, Serialize)]
pub(crate) struct HierarchyResponse {
    pub(crate) selection: CascadeSelection,
    pub(crate) institutes: Vec<InstituteResponse>,
    pub(crate) departments: Vec<DepartmentResponse>,
    pub(crate) academic_years: Vec<AcademicYearResponse>,
    pub(crate) semesters: Vec<SemesterResponse>,
    pub(crate) classes: Vec<ClassResponse>,
}

impl HierarchyResponse {
    pub(crate) fn build(selection: CascadeSelection, options: LevelOptions<'_>) -> Self {
        Self {
            selection,
            institutes: options.institutes.into_iter().map(InstituteResponse::from_db).collect(),
            departments: options.departments.into_iter().map(DepartmentResponse::from_db).collect(),
            academic_years: options
                .academic_years
                .into_iter()
                .map(AcademicYearResponse::from_db)
                .collect(),
            semesters: options.semesters.into_iter().map(SemesterResponse::from_db).collect(),
            classes: options.classes.into_iter().map(ClassResponse::from_db).collect(),
        }
    }
}
