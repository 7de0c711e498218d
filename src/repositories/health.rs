use sqlx::PgPool;
use time::PrimitiveDateTime;

/// Round trip to the database, returning its current UTC clock.
pub(crate) async fn database_time(pool: &PgPool) -> Result<PrimitiveDateTime, sqlx::Error> {
    sqlx::query_scalar::<_, PrimitiveDateTime>("SELECT (now() AT TIME ZONE 'utc')::timestamp")
        .fetch_one(pool)
        .await
}
