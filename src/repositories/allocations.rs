use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

/// One allocation with the display names of everything it points at. The
/// department comes from the year, or from the class's semester when the year
/// is institution-wide.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct AllocationRow {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) teacher_name: String,
    pub(crate) teacher_enrollment: String,
    pub(crate) subject_id: String,
    pub(crate) subject_name: String,
    pub(crate) subject_code: String,
    pub(crate) class_id: String,
    pub(crate) class_name: String,
    pub(crate) semester_id: String,
    pub(crate) semester_name: String,
    pub(crate) academic_year_id: String,
    pub(crate) academic_year_name: String,
    pub(crate) department_id: Option<String>,
    pub(crate) department_name: Option<String>,
    pub(crate) institute_id: Option<String>,
    pub(crate) institute_name: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

const AGGREGATE_SELECT: &str = "\
    SELECT sa.id, \
           sa.teacher_id, t.name AS teacher_name, t.enrollment_number AS teacher_enrollment, \
           sa.subject_id, s.name AS subject_name, s.code AS subject_code, \
           sa.class_id, c.name AS class_name, \
           sem.id AS semester_id, sem.name AS semester_name, \
           sa.academic_year_id, y.name AS academic_year_name, \
           d.id AS department_id, d.name AS department_name, \
           i.id AS institute_id, i.name AS institute_name, \
           sa.created_at \
    FROM subject_allocations sa \
    JOIN users t ON t.id = sa.teacher_id \
    JOIN subjects s ON s.id = sa.subject_id \
    JOIN classes c ON c.id = sa.class_id \
    JOIN semesters sem ON sem.id = c.semester_id \
    JOIN academic_years y ON y.id = sa.academic_year_id \
    LEFT JOIN departments d ON d.id = COALESCE(y.department_id, sem.department_id) \
    LEFT JOIN institutes i ON i.id = d.institute_id";

pub(crate) struct CreateAllocation<'a> {
    pub(crate) id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) subject_id: &'a str,
    pub(crate) class_id: &'a str,
    pub(crate) academic_year_id: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct UpdateAllocation {
    pub(crate) teacher_id: Option<String>,
    pub(crate) subject_id: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) academic_year_id: Option<String>,
}

pub(crate) async fn create(pool: &PgPool, params: CreateAllocation<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subject_allocations (
            id, teacher_id, subject_id, class_id, academic_year_id, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6)",
    )
    .bind(params.id)
    .bind(params.teacher_id)
    .bind(params.subject_id)
    .bind(params.class_id)
    .bind(params.academic_year_id)
    .bind(params.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Idempotent insert used by roster import. Returns `true` when a new row was
/// written.
pub(crate) async fn ensure(pool: &PgPool, params: CreateAllocation<'_>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO subject_allocations (
            id, teacher_id, subject_id, class_id, academic_year_id, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6)
         ON CONFLICT ON CONSTRAINT subject_allocations_unique DO NOTHING",
    )
    .bind(params.id)
    .bind(params.teacher_id)
    .bind(params.subject_id)
    .bind(params.class_id)
    .bind(params.academic_year_id)
    .bind(params.created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AllocationRow>, sqlx::Error> {
    sqlx::query_as::<_, AllocationRow>(&format!("{AGGREGATE_SELECT} WHERE sa.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<AllocationRow>, sqlx::Error> {
    sqlx::query_as::<_, AllocationRow>(&format!(
        "{AGGREGATE_SELECT} ORDER BY sa.created_at DESC, sa.id"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_teacher(
    pool: &PgPool,
    teacher_id: &str,
) -> Result<Vec<AllocationRow>, sqlx::Error> {
    sqlx::query_as::<_, AllocationRow>(&format!(
        "{AGGREGATE_SELECT} WHERE sa.teacher_id = $1 ORDER BY c.name, s.name"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

/// Whether the teacher holds any allocation for the class, optionally narrowed
/// to one subject.
pub(crate) async fn teacher_teaches(
    pool: &PgPool,
    teacher_id: &str,
    class_id: &str,
    subject_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM subject_allocations
            WHERE teacher_id = $1
              AND class_id = $2
              AND ($3::text IS NULL OR subject_id = $3)
         )",
    )
    .bind(teacher_id)
    .bind(class_id)
    .bind(subject_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAllocation,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subject_allocations SET
            teacher_id = COALESCE($1, teacher_id),
            subject_id = COALESCE($2, subject_id),
            class_id = COALESCE($3, class_id),
            academic_year_id = COALESCE($4, academic_year_id)
         WHERE id = $5",
    )
    .bind(params.teacher_id)
    .bind(params.subject_id)
    .bind(params.class_id)
    .bind(params.academic_year_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM subject_allocations WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
