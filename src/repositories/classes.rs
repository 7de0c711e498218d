use sqlx::PgPool;

use crate::db::models::Class;

const COLUMNS: &str = "id, name, semester_id, created_at";

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    name: &str,
    semester_id: &str,
    created_at: time::PrimitiveDateTime,
) -> Result<Class, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (id, name, semester_id, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(semester_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    semester_id: Option<&str>,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "SELECT {COLUMNS} FROM classes
         WHERE ($1::text IS NULL OR semester_id = $1)
         ORDER BY name"
    ))
    .bind(semester_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!("SELECT {COLUMNS} FROM classes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    name: Option<&str>,
    semester_id: Option<&str>,
) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>(&format!(
        "UPDATE classes SET
            name = COALESCE($1, name),
            semester_id = COALESCE($2, semester_id)
         WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(semester_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM classes WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
