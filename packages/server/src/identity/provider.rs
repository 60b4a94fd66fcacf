use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::entity::{auth_identity, auth_session};
use crate::utils::hash;

/// Errors raised by the identity collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an identity with email {0} already exists")]
    EmailTaken(String),
    #[error("identity not found")]
    IdentityNotFound,
    #[error("password hash error: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] DbErr),
}

/// A freshly opened login session.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub identity_id: Uuid,
    pub session_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// The live session behind a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub identity_id: Uuid,
    pub email: String,
}

/// Authentication collaborator: credentials, sessions and identity lifecycle.
///
/// Profile rows (`users`, `faculty`, `students`) are not touched here; they belong
/// to the workflows that call `create_identity`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionGrant, AuthError>;

    async fn sign_out(&self, session_id: Uuid) -> Result<(), AuthError>;

    /// `None` when the session is unknown, revoked or expired.
    async fn current_session(&self, session_id: Uuid) -> Result<Option<SessionInfo>, AuthError>;

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<Uuid, AuthError>;

    async fn change_password(
        &self,
        identity_id: Uuid,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError>;

    async fn delete_identity(&self, identity_id: Uuid) -> Result<(), AuthError>;
}

/// Identity provider backed by the `auth_identity` and `auth_session` tables.
#[derive(Clone)]
pub struct DbIdentityProvider {
    db: DatabaseConnection,
    session_ttl: Duration,
}

impl DbIdentityProvider {
    pub fn new(db: DatabaseConnection, session_ttl_hours: i64) -> Self {
        Self {
            db,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<auth_identity::Model>, DbErr> {
        auth_identity::Entity::find()
            .filter(auth_identity::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
    }
}

/// Emails are compared trimmed and lowercased everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_error(e: argon2::password_hash::Error) -> AuthError {
    AuthError::Hash(e.to_string())
}

#[async_trait]
impl IdentityProvider for DbIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionGrant, AuthError> {
        let identity = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !hash::verify_password(password, &identity.password_hash).map_err(hash_error)? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = auth_session::ActiveModel {
            id: Set(Uuid::new_v4()),
            identity_id: Set(identity.id),
            issued_at: Set(now),
            expires_at: Set(now + self.session_ttl),
            revoked_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        Ok(SessionGrant {
            identity_id: identity.id,
            session_id: session.id,
            email: identity.email,
            expires_at: session.expires_at,
        })
    }

    async fn sign_out(&self, session_id: Uuid) -> Result<(), AuthError> {
        let Some(session) = auth_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
        else {
            return Ok(());
        };
        if session.revoked_at.is_none() {
            let mut active: auth_session::ActiveModel = session.into();
            active.revoked_at = Set(Some(Utc::now()));
            active.update(&self.db).await?;
        }
        Ok(())
    }

    async fn current_session(&self, session_id: Uuid) -> Result<Option<SessionInfo>, AuthError> {
        let Some(session) = auth_session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        if session.revoked_at.is_some() || session.expires_at <= Utc::now() {
            return Ok(None);
        }

        // The identity may have been deleted while the session was live.
        let identity = auth_identity::Entity::find_by_id(session.identity_id)
            .one(&self.db)
            .await?;
        Ok(identity.map(|i| SessionInfo {
            identity_id: i.id,
            email: i.email,
        }))
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<Uuid, AuthError> {
        let email = normalize_email(email);
        let password_hash = hash::hash_password(password).map_err(hash_error)?;

        let model = auth_identity::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            metadata: Set(metadata),
            created_at: Set(Utc::now()),
        };

        match model.insert(&self.db).await {
            Ok(identity) => {
                tracing::info!(identity_id = %identity.id, "Created auth identity");
                Ok(identity.id)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AuthError::EmailTaken(email))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn change_password(
        &self,
        identity_id: Uuid,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        let identity = auth_identity::Entity::find_by_id(identity_id)
            .one(&self.db)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if !hash::verify_password(current, &identity.password_hash).map_err(hash_error)? {
            return Err(AuthError::InvalidCredentials);
        }

        let mut active: auth_identity::ActiveModel = identity.into();
        active.password_hash = Set(hash::hash_password(new).map_err(hash_error)?);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn delete_identity(&self, identity_id: Uuid) -> Result<(), AuthError> {
        auth_session::Entity::delete_many()
            .filter(auth_session::Column::IdentityId.eq(identity_id))
            .exec(&self.db)
            .await?;
        let res = auth_identity::Entity::delete_by_id(identity_id)
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(AuthError::IdentityNotFound);
        }
        tracing::info!(%identity_id, "Deleted auth identity");
        Ok(())
    }
}
