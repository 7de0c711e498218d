use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use crate::db::models::AcademicYear;

const COLUMNS: &str = "id, name, start_date, end_date, department_id, is_active, created_at";

pub(crate) struct CreateAcademicYear<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) department_id: Option<&'a str>,
    pub(crate) is_active: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateAcademicYear {
    pub(crate) name: Option<String>,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
}

/// Inserts the year. An active year first retires the other active years of
/// its scope, and their semesters, in the same transaction.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAcademicYear<'_>,
) -> Result<AcademicYear, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if params.is_active {
        deactivate_scope(&mut tx, params.department_id, None).await?;
    }

    let year = sqlx::query_as::<_, AcademicYear>(&format!(
        "INSERT INTO academic_years (
            id, name, start_date, end_date, department_id, is_active, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.department_id)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(year)
}

pub(crate) async fn list(
    pool: &PgPool,
    department_id: Option<&str>,
) -> Result<Vec<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!(
        "SELECT {COLUMNS} FROM academic_years
         WHERE ($1::text IS NULL OR department_id = $1)
         ORDER BY created_at DESC"
    ))
    .bind(department_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    sqlx::query_as::<_, AcademicYear>(&format!("SELECT {COLUMNS} FROM academic_years WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Year a class belongs to, through its semester.
pub(crate) async fn find_for_class(
    pool: &PgPool,
    class_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT s.academic_year_id
         FROM classes c
         JOIN semesters s ON s.id = c.semester_id
         WHERE c.id = $1",
    )
    .bind(class_id)
    .fetch_optional(pool)
    .await
}

pub(crate) enum YearUpdate {
    Updated(AcademicYear),
    NotFound,
    SemestersOutside,
}

/// Applies the edit unless the new bounds would leave one of the year's
/// semesters outside them.
pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAcademicYear,
) -> Result<YearUpdate, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let bounds = sqlx::query_as::<_, (Date, Date)>(
        "SELECT start_date, end_date FROM academic_years WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((current_start, current_end)) = bounds else {
        return Ok(YearUpdate::NotFound);
    };
    let start_date = params.start_date.unwrap_or(current_start);
    let end_date = params.end_date.unwrap_or(current_end);

    let outside = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM semesters
         WHERE academic_year_id = $1
           AND ((start_date IS NOT NULL AND (start_date < $2 OR start_date > $3))
             OR (end_date IS NOT NULL AND (end_date < $2 OR end_date > $3)))",
    )
    .bind(id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    if outside > 0 {
        return Ok(YearUpdate::SemestersOutside);
    }

    let year = sqlx::query_as::<_, AcademicYear>(&format!(
        "UPDATE academic_years SET
            name = COALESCE($1, name),
            start_date = $2,
            end_date = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(start_date)
    .bind(end_date)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(YearUpdate::Updated(year))
}

/// Flips `is_active`. Deactivation takes every semester of the year down with
/// it; activation retires the rest of the scope first.
pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    is_active: bool,
) -> Result<Option<AcademicYear>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let scope = sqlx::query_scalar::<_, Option<String>>(
        "SELECT department_id FROM academic_years WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(department_id) = scope else {
        return Ok(None);
    };

    if is_active {
        deactivate_scope(&mut tx, department_id.as_deref(), Some(id)).await?;
    } else {
        sqlx::query("UPDATE semesters SET is_active = FALSE WHERE academic_year_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let year = sqlx::query_as::<_, AcademicYear>(&format!(
        "UPDATE academic_years SET is_active = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(is_active)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(year))
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM academic_years WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

async fn deactivate_scope(
    tx: &mut Transaction<'_, Postgres>,
    department_id: Option<&str>,
    keep_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    let retired = sqlx::query_scalar::<_, String>(
        "UPDATE academic_years SET is_active = FALSE
         WHERE is_active
           AND department_id IS NOT DISTINCT FROM $1
           AND ($2::text IS NULL OR id <> $2)
         RETURNING id",
    )
    .bind(department_id)
    .bind(keep_id)
    .fetch_all(&mut **tx)
    .await?;

    if !retired.is_empty() {
        sqlx::query("UPDATE semesters SET is_active = FALSE WHERE academic_year_id = ANY($1)")
            .bind(&retired)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}
