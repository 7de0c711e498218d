use sqlx::PgPool;
use time::Date;

use crate::db::models::Semester;
use crate::db::types::SemesterType;

const COLUMNS: &str = "\
    id, name, semester_type, start_date, end_date, academic_year_id, department_id, \
    is_active, created_at";

pub(crate) struct CreateSemester<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) semester_type: SemesterType,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
    pub(crate) academic_year_id: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateSemester {
    pub(crate) name: Option<String>,
    pub(crate) semester_type: Option<SemesterType>,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
}

pub(crate) enum StatusChange {
    Updated(Semester),
    NotFound,
    YearInactive,
}

/// New semesters always start inactive and take the department of their year.
/// `None` when the year does not exist.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSemester<'_>,
) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>(&format!(
        "INSERT INTO semesters (
            id, name, semester_type, start_date, end_date, academic_year_id,
            department_id, is_active, created_at
         )
         SELECT $1, $2, $3, $4, $5, y.id, y.department_id, FALSE, $6
         FROM academic_years y
         WHERE y.id = $7
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.semester_type)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.created_at)
    .bind(params.academic_year_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    academic_year_id: Option<&str>,
) -> Result<Vec<Semester>, sqlx::Error> {
    match academic_year_id {
        Some(year_id) => {
            sqlx::query_as::<_, Semester>(&format!(
                "SELECT {COLUMNS} FROM semesters WHERE academic_year_id = $1 ORDER BY name"
            ))
            .bind(year_id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Semester>(&format!(
                "SELECT {COLUMNS} FROM semesters ORDER BY created_at DESC"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>(&format!("SELECT {COLUMNS} FROM semesters WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSemester,
) -> Result<Option<Semester>, sqlx::Error> {
    sqlx::query_as::<_, Semester>(&format!(
        "UPDATE semesters SET
            name = COALESCE($1, name),
            semester_type = COALESCE($2, semester_type),
            start_date = COALESCE($3, start_date),
            end_date = COALESCE($4, end_date)
         WHERE id = $5
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.semester_type)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Activation is refused while the parent year is inactive. The year row is
/// locked so a concurrent year deactivation cannot interleave.
pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    is_active: bool,
) -> Result<StatusChange, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let year_active = sqlx::query_scalar::<_, bool>(
        "SELECT y.is_active
         FROM semesters s
         JOIN academic_years y ON y.id = s.academic_year_id
         WHERE s.id = $1
         FOR UPDATE OF y",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(year_active) = year_active else {
        return Ok(StatusChange::NotFound);
    };

    if is_active && !year_active {
        return Ok(StatusChange::YearInactive);
    }

    let semester = sqlx::query_as::<_, Semester>(&format!(
        "UPDATE semesters SET is_active = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(StatusChange::Updated(semester))
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM semesters WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
