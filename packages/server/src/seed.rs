use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;

use crate::config::BootstrapConfig;
use crate::error::AppError;
use crate::identity::{AuthError, IdentityProvider, Role, normalize_email};
use crate::models::shared::validate_email;
use crate::repository::users;

/// Create the configured HOD account when it does not exist yet.
///
/// Skipped when no bootstrap email or password is configured, or when a `users` row
/// with that email is already present.
pub async fn bootstrap_hod(
    db: &DatabaseConnection,
    identities: &dyn IdentityProvider,
    bootstrap: &BootstrapConfig,
) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&bootstrap.hod_email, &bootstrap.hod_password) else {
        return Ok(());
    };
    let email = validate_email(&normalize_email(email))?;
    if users::email_exists(db, &email).await? {
        tracing::debug!(%email, "Bootstrap HOD already present");
        return Ok(());
    }

    let full_name = bootstrap
        .hod_name
        .clone()
        .unwrap_or_else(|| "Head of Department".to_string());
    let identity_id = match identities
        .create_identity(
            &email,
            password,
            json!({ "full_name": full_name, "role": Role::Hod }),
        )
        .await
    {
        Ok(id) => id,
        Err(AuthError::EmailTaken(_)) => {
            tracing::warn!(
                %email,
                "Bootstrap login exists without a users row; reconcile it manually"
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    users::insert(db, identity_id, &email, &full_name, Role::Hod, None, None).await?;
    info!(%email, "Seeded bootstrap HOD account");
    Ok(())
}
