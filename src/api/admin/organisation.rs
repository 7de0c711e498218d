use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{
    ensure_date_order, ensure_within_year, parse_date_field, parse_optional_date, validate_payload,
};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::AcademicYear;
use crate::repositories;
use crate::repositories::academic_years::YearUpdate;
use crate::repositories::semesters::StatusChange;
use crate::schemas::hierarchy::{
    AcademicYearCreate, AcademicYearQuery, AcademicYearResponse, AcademicYearUpdate, ClassCreate,
    ClassQuery, ClassResponse, ClassUpdate, DepartmentCreate, DepartmentQuery, DepartmentResponse,
    DepartmentUpdate, HierarchyResponse, InstitutePayload, InstituteResponse, SemesterCreate,
    SemesterQuery, SemesterResponse, SemesterUpdate, StatusUpdate,
};
use crate::schemas::MessageResponse;
use crate::services::hierarchy::{self, CascadeSelection, MasterData};

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Institutes

pub(super) async fn create_institute(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<InstitutePayload>,
) -> Result<(StatusCode, Json<InstituteResponse>), ApiError> {
    validate_payload(&payload)?;
    let institute = repositories::institutes::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Institute already exists", "Failed to create institute"))?;

    Ok((StatusCode::CREATED, Json(InstituteResponse::from_db(&institute))))
}

pub(super) async fn list_institutes(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<InstituteResponse>>, ApiError> {
    let institutes = repositories::institutes::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list institutes"))?;
    Ok(Json(institutes.iter().map(InstituteResponse::from_db).collect()))
}

pub(super) async fn update_institute(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<InstitutePayload>,
) -> Result<Json<InstituteResponse>, ApiError> {
    validate_payload(&payload)?;
    let institute = repositories::institutes::rename(state.db(), &id, payload.name.trim())
        .await
        .map_err(|e| ApiError::from_write(e, "Institute already exists", "Failed to update institute"))?
        .ok_or_else(|| ApiError::NotFound("Institute not found".to_string()))?;
    Ok(Json(InstituteResponse::from_db(&institute)))
}

pub(super) async fn delete_institute(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::institutes::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete institute"))?;
    if !deleted {
        return Err(ApiError::NotFound("Institute not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Institute deleted")))
}

// Departments

pub(super) async fn create_department(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<DepartmentCreate>,
) -> Result<(StatusCode, Json<DepartmentResponse>), ApiError> {
    validate_payload(&payload)?;
    let department = repositories::departments::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        payload.institute_id.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Department already exists", "Failed to create department")
    })?;

    Ok((StatusCode::CREATED, Json(DepartmentResponse::from_db(&department))))
}

pub(super) async fn list_departments(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<DepartmentQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let departments =
        repositories::departments::list(state.db(), non_blank(query.institute_id.as_deref()))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list departments"))?;
    Ok(Json(departments.iter().map(DepartmentResponse::from_db).collect()))
}

pub(super) async fn update_department(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<DepartmentUpdate>,
) -> Result<Json<DepartmentResponse>, ApiError> {
    let department = repositories::departments::update(
        state.db(),
        &id,
        non_blank(payload.name.as_deref()),
        non_blank(payload.institute_id.as_deref()),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Department already exists", "Failed to update department"))?
    .ok_or_else(|| ApiError::NotFound("Department not found".to_string()))?;
    Ok(Json(DepartmentResponse::from_db(&department)))
}

pub(super) async fn delete_department(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::departments::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete department"))?;
    if !deleted {
        return Err(ApiError::NotFound("Department not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Department deleted")))
}

// Academic years

pub(super) async fn create_year(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AcademicYearCreate>,
) -> Result<(StatusCode, Json<AcademicYearResponse>), ApiError> {
    validate_payload(&payload)?;
    let start_date = parse_date_field(&payload.start_date, "start_date")?;
    let end_date = parse_date_field(&payload.end_date, "end_date")?;
    ensure_date_order(Some(start_date), Some(end_date))?;

    let year = repositories::academic_years::create(
        state.db(),
        repositories::academic_years::CreateAcademicYear {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            start_date,
            end_date,
            department_id: non_blank(payload.department_id.as_deref()),
            is_active: payload.is_active,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Academic year already exists", "Failed to create academic year")
    })?;

    tracing::info!(year_id = %year.id, is_active = year.is_active, "academic year created");
    Ok((StatusCode::CREATED, Json(AcademicYearResponse::from_db(&year))))
}

pub(super) async fn list_years(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<AcademicYearQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AcademicYearResponse>>, ApiError> {
    let years =
        repositories::academic_years::list(state.db(), non_blank(query.department_id.as_deref()))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list academic years"))?;
    Ok(Json(years.iter().map(AcademicYearResponse::from_db).collect()))
}

pub(super) async fn update_year(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AcademicYearUpdate>,
) -> Result<Json<AcademicYearResponse>, ApiError> {
    let current = fetch_year(&state, &id).await?;
    let start_date = parse_optional_date(payload.start_date.as_deref(), "start_date")?;
    let end_date = parse_optional_date(payload.end_date.as_deref(), "end_date")?;
    ensure_date_order(
        Some(start_date.unwrap_or(current.start_date)),
        Some(end_date.unwrap_or(current.end_date)),
    )?;

    let outcome = repositories::academic_years::update(
        state.db(),
        &id,
        repositories::academic_years::UpdateAcademicYear {
            name: non_blank(payload.name.as_deref()).map(str::to_string),
            start_date,
            end_date,
        },
    )
    .await
    .map_err(|e| {
        ApiError::from_write(e, "Academic year already exists", "Failed to update academic year")
    })?;

    match outcome {
        YearUpdate::Updated(year) => Ok(Json(AcademicYearResponse::from_db(&year))),
        YearUpdate::NotFound => Err(ApiError::NotFound("Academic year not found".to_string())),
        YearUpdate::SemestersOutside => Err(ApiError::BadRequest(
            "Academic year dates must cover the dates of its semesters".to_string(),
        )),
    }
}

pub(super) async fn set_year_status(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<AcademicYearResponse>, ApiError> {
    let year = repositories::academic_years::set_status(state.db(), &id, payload.is_active)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update academic year status"))?
        .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))?;

    tracing::info!(year_id = %year.id, is_active = year.is_active, "academic year status changed");
    Ok(Json(AcademicYearResponse::from_db(&year)))
}

pub(super) async fn delete_year(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::academic_years::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete academic year"))?;
    if !deleted {
        return Err(ApiError::NotFound("Academic year not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Academic year deleted")))
}

async fn fetch_year(state: &AppState, id: &str) -> Result<AcademicYear, ApiError> {
    repositories::academic_years::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load academic year"))?
        .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))
}

// Semesters

pub(super) async fn create_semester(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SemesterCreate>,
) -> Result<(StatusCode, Json<SemesterResponse>), ApiError> {
    validate_payload(&payload)?;
    let year = fetch_year(&state, payload.academic_year_id.trim()).await?;
    let start_date = parse_optional_date(payload.start_date.as_deref(), "start_date")?;
    let end_date = parse_optional_date(payload.end_date.as_deref(), "end_date")?;
    ensure_within_year(&year, start_date, end_date)?;

    let semester = repositories::semesters::create(
        state.db(),
        repositories::semesters::CreateSemester {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            semester_type: payload.semester_type,
            start_date,
            end_date,
            academic_year_id: &year.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Semester already exists", "Failed to create semester"))?
    .ok_or_else(|| ApiError::NotFound("Academic year not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(SemesterResponse::from_db(&semester))))
}

pub(super) async fn list_semesters(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<SemesterQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SemesterResponse>>, ApiError> {
    let semesters = repositories::semesters::list(state.db(), non_blank(query.year_id.as_deref()))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list semesters"))?;
    Ok(Json(semesters.iter().map(SemesterResponse::from_db).collect()))
}

pub(super) async fn update_semester(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SemesterUpdate>,
) -> Result<Json<SemesterResponse>, ApiError> {
    let current = repositories::semesters::find_by_id(state.db(), &id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load semester"))?
        .ok_or_else(|| ApiError::NotFound("Semester not found".to_string()))?;
    let year = fetch_year(&state, &current.academic_year_id).await?;

    let start_date = parse_optional_date(payload.start_date.as_deref(), "start_date")?;
    let end_date = parse_optional_date(payload.end_date.as_deref(), "end_date")?;
    ensure_within_year(&year, start_date.or(current.start_date), end_date.or(current.end_date))?;

    let semester = repositories::semesters::update(
        state.db(),
        &id,
        repositories::semesters::UpdateSemester {
            name: non_blank(payload.name.as_deref()).map(str::to_string),
            semester_type: payload.semester_type,
            start_date,
            end_date,
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Semester already exists", "Failed to update semester"))?
    .ok_or_else(|| ApiError::NotFound("Semester not found".to_string()))?;
    Ok(Json(SemesterResponse::from_db(&semester)))
}

pub(super) async fn set_semester_status(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<SemesterResponse>, ApiError> {
    let change = repositories::semesters::set_status(state.db(), &id, payload.is_active)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update semester status"))?;

    match change {
        StatusChange::Updated(semester) => Ok(Json(SemesterResponse::from_db(&semester))),
        StatusChange::NotFound => Err(ApiError::NotFound("Semester not found".to_string())),
        StatusChange::YearInactive => Err(ApiError::BadRequest(
            "Cannot activate a semester while its academic year is inactive".to_string(),
        )),
    }
}

pub(super) async fn delete_semester(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::semesters::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete semester"))?;
    if !deleted {
        return Err(ApiError::NotFound("Semester not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Semester deleted")))
}

// Classes

pub(super) async fn create_class(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassCreate>,
) -> Result<(StatusCode, Json<ClassResponse>), ApiError> {
    validate_payload(&payload)?;
    let class = repositories::classes::create(
        state.db(),
        &Uuid::new_v4().to_string(),
        payload.name.trim(),
        payload.semester_id.trim(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Class already exists", "Failed to create class"))?;

    Ok((StatusCode::CREATED, Json(ClassResponse::from_db(&class))))
}

pub(super) async fn list_classes(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<ClassQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, ApiError> {
    let classes = repositories::classes::list(state.db(), non_blank(query.semester_id.as_deref()))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;
    Ok(Json(classes.iter().map(ClassResponse::from_db).collect()))
}

pub(super) async fn update_class(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ClassUpdate>,
) -> Result<Json<ClassResponse>, ApiError> {
    let class = repositories::classes::update(
        state.db(),
        &id,
        non_blank(payload.name.as_deref()),
        non_blank(payload.semester_id.as_deref()),
    )
    .await
    .map_err(|e| ApiError::from_write(e, "Class already exists", "Failed to update class"))?
    .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;
    Ok(Json(ClassResponse::from_db(&class)))
}

pub(super) async fn delete_class(
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = repositories::classes::delete(state.db(), &id)
        .await
        .map_err(|e| ApiError::from_delete(e, "Failed to delete class"))?;
    if !deleted {
        return Err(ApiError::NotFound("Class not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Class deleted")))
}

// Cascading selector

pub(super) async fn hierarchy(
    CurrentAdmin(_admin): CurrentAdmin,
    Query(mut selection): Query<CascadeSelection>,
    State(state): State<AppState>,
) -> Result<Json<HierarchyResponse>, ApiError> {
    let master = MasterData::load(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load hierarchy"))?;

    selection.retain_valid(&master);
    let options = hierarchy::options(&master, &selection);
    Ok(Json(HierarchyResponse::build(selection, options)))
}
