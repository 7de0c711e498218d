use sqlx::PgPool;

use crate::db::models::Subject;

const COLUMNS: &str = "id, name, code, institute_id, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    code: &str,
    institute_id: Option<&str>,
    created_at: time::PrimitiveDateTime,
) -> Result<Subject, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (id, name, code, institute_id, created_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(code)
    .bind(institute_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects ORDER BY name"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!("SELECT {COLUMNS} FROM subjects WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    code: Option<&str>,
    institute_id: Option<&str>,
) -> Result<Option<Subject>, sqlx::Error> {
    sqlx::query_as::<_, Subject>(&format!(
        "UPDATE subjects SET
            name = COALESCE($1, name),
            code = COALESCE($2, code),
            institute_id = COALESCE($3, institute_id)
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(code)
    .bind(institute_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
