use sqlx::PgPool;

use crate::db::models::Institute;

const COLUMNS: &str = "id, name, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<Institute, sqlx::Error> {
    sqlx::query_as::<_, Institute>(&format!(
        "INSERT INTO institutes (id, name, created_at) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Institute>, sqlx::Error> {
    sqlx::query_as::<_, Institute>(&format!("SELECT {COLUMNS} FROM institutes ORDER BY name"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Institute>, sqlx::Error> {
    sqlx::query_as::<_, Institute>(&format!("SELECT {COLUMNS} FROM institutes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn rename(
    pool: &PgPool,
    id: &str,
    name: &str,
) -> Result<Option<Institute>, sqlx::Error> {
    sqlx::query_as::<_, Institute>(&format!(
        "UPDATE institutes SET name = $1 WHERE id = $2 RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Departments, years, semesters and classes below the institute go with it.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM institutes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
