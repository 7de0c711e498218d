use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, name, email, enrollment_number, role, password_hash, face_image_url, \
    class_id, institute_id, created_at, updated_at";

/// Directory row used by admin and teacher listings; never carries the hash.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct PersonRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) enrollment_number: String,
    pub(crate) role: UserRole,
    pub(crate) class_id: Option<String>,
    pub(crate) class_name: Option<String>,
    pub(crate) institute_id: Option<String>,
    pub(crate) face_image_url: Option<String>,
    pub(crate) is_activated: bool,
}

const PERSON_SELECT: &str = "\
    SELECT u.id, u.name, u.email, u.enrollment_number, u.role, u.class_id, \
           c.name AS class_name, u.institute_id, u.face_image_url, \
           (u.password_hash IS NOT NULL) AS is_activated \
    FROM users u \
    LEFT JOIN classes c ON c.id = u.class_id";

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) enrollment_number: &'a str,
    pub(crate) role: UserRole,
    pub(crate) password_hash: Option<String>,
    pub(crate) class_id: Option<&'a str>,
    pub(crate) institute_id: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct UpdatePerson {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) enrollment_number: Option<String>,
    pub(crate) class_id: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct RosterUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) enrollment_number: &'a str,
    pub(crate) role: UserRole,
    pub(crate) class_id: Option<&'a str>,
    pub(crate) institute_id: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_enrollment(
    pool: &PgPool,
    enrollment_number: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE enrollment_number = $1"))
        .bind(enrollment_number)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, name, email, enrollment_number, role, password_hash,
            class_id, institute_id, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.enrollment_number)
    .bind(params.role)
    .bind(params.password_hash)
    .bind(params.class_id)
    .bind(params.institute_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// Sets the first password of a pre-provisioned account. Returns `None` when
/// the account is unknown or already activated.
pub(crate) async fn activate(
    pool: &PgPool,
    enrollment_number: &str,
    password_hash: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET password_hash = $1, updated_at = $2
         WHERE enrollment_number = $3 AND password_hash IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(password_hash)
    .bind(updated_at)
    .bind(enrollment_number)
    .fetch_optional(pool)
    .await
}

/// Only accounts that have not been activated yet accept a new face image.
pub(crate) async fn set_face_image(
    pool: &PgPool,
    enrollment_number: &str,
    face_image_url: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET face_image_url = $1, updated_at = $2
         WHERE enrollment_number = $3 AND password_hash IS NULL
         RETURNING {COLUMNS}"
    ))
    .bind(face_image_url)
    .bind(updated_at)
    .bind(enrollment_number)
    .fetch_optional(pool)
    .await
}

/// Makes the bootstrap account an admin with the configured password.
pub(crate) async fn promote_admin(
    pool: &PgPool,
    id: &str,
    password_hash: &str,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = $1, password_hash = $2, updated_at = $3 WHERE id = $4")
        .bind(UserRole::Admin)
        .bind(password_hash)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Inserts or refreshes a roster row keyed by enrollment number. The password
/// hash is never written, so activated accounts stay activated. Admin accounts
/// are left alone and yield `None`. Teachers lose any class they had.
pub(crate) async fn upsert_roster_user(
    pool: &PgPool,
    params: RosterUser<'_>,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "INSERT INTO users (
            id, name, email, enrollment_number, role, class_id, institute_id,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         ON CONFLICT (enrollment_number) DO UPDATE SET
            name = EXCLUDED.name,
            email = EXCLUDED.email,
            role = EXCLUDED.role,
            class_id = CASE
                WHEN EXCLUDED.role = $10 THEN NULL
                ELSE COALESCE(EXCLUDED.class_id, users.class_id)
            END,
            institute_id = COALESCE(EXCLUDED.institute_id, users.institute_id),
            updated_at = EXCLUDED.updated_at
         WHERE users.role <> $9
         RETURNING id",
    )
    .bind(params.id)
    .bind(params.name)
    .bind(params.email)
    .bind(params.enrollment_number)
    .bind(params.role)
    .bind(params.class_id)
    .bind(params.institute_id)
    .bind(params.now)
    .bind(UserRole::Admin)
    .bind(UserRole::Teacher)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_people(
    pool: &PgPool,
    role: UserRole,
    class_id: Option<&str>,
) -> Result<Vec<PersonRow>, sqlx::Error> {
    sqlx::query_as::<_, PersonRow>(&format!(
        "{PERSON_SELECT}
         WHERE u.role = $1 AND ($2::text IS NULL OR u.class_id = $2)
         ORDER BY u.name, u.enrollment_number"
    ))
    .bind(role)
    .bind(class_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_person(
    pool: &PgPool,
    id: &str,
    role: UserRole,
) -> Result<Option<PersonRow>, sqlx::Error> {
    sqlx::query_as::<_, PersonRow>(&format!("{PERSON_SELECT} WHERE u.id = $1 AND u.role = $2"))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
}

/// Edits a teacher or student. Returns `false` when no row of that role has
/// the id.
pub(crate) async fn update_person(
    pool: &PgPool,
    id: &str,
    role: UserRole,
    params: UpdatePerson,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET
            name = COALESCE($1, name),
            email = COALESCE($2, email),
            enrollment_number = COALESCE($3, enrollment_number),
            class_id = COALESCE($4, class_id),
            updated_at = $5
         WHERE id = $6 AND role = $7",
    )
    .bind(params.name)
    .bind(params.email)
    .bind(params.enrollment_number)
    .bind(params.class_id)
    .bind(params.updated_at)
    .bind(id)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_person(
    pool: &PgPool,
    id: &str,
    role: UserRole,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = $2")
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
