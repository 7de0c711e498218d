use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Makes sure the configured first admin can log in. Creates the account when
/// missing, otherwise restores the admin role and configured password.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let enrollment = &admin.first_admin_enrollment;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_enrollment(state.db(), enrollment).await? {
        let password_ok = user
            .password_hash
            .as_deref()
            .map(|hash| security::verify_password(&admin.first_admin_password, hash).unwrap_or(false))
            .unwrap_or(false);

        if password_ok && user.role == UserRole::Admin {
            tracing::info!(enrollment = %enrollment, "Bootstrap admin already up to date");
            return Ok(());
        }

        let hash = security::hash_password(&admin.first_admin_password)?;
        repositories::users::promote_admin(state.db(), &user.id, &hash, now).await?;
        tracing::info!(enrollment = %enrollment, "Updated bootstrap admin");
        return Ok(());
    }

    let hash = security::hash_password(&admin.first_admin_password)?;
    let id = Uuid::new_v4().to_string();
    let email = format!("{}@veriviva.local", enrollment.to_ascii_lowercase());
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &id,
            name: "Administrator",
            email: &email,
            enrollment_number: enrollment,
            role: UserRole::Admin,
            password_hash: Some(hash),
            class_id: None,
            institute_id: None,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(enrollment = %enrollment, "Created bootstrap admin");
    Ok(())
}
