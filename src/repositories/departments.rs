use sqlx::PgPool;

use crate::db::models::Department;

const COLUMNS: &str = "id, name, institute_id, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    institute_id: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<Department, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "INSERT INTO departments (id, name, institute_id, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(institute_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    institute_id: Option<&str>,
) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "SELECT {COLUMNS} FROM departments
         WHERE ($1::text IS NULL OR institute_id = $1)
         ORDER BY name"
    ))
    .bind(institute_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!("SELECT {COLUMNS} FROM departments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    institute_id: Option<&str>,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "UPDATE departments SET
            name = COALESCE($1, name),
            institute_id = COALESCE($2, institute_id)
         WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(institute_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
