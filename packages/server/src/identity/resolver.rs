use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::Role;
use crate::entity::{faculty, student, user};

/// Outcome of looking a session's email up in `users`.
#[derive(Debug, Clone)]
pub enum RoleResolution {
    Known { user: user::Model, role: Role },
    /// No row, an unparseable role string, or a failed lookup.
    Unknown,
}

/// The role-specific profile row backing an identity.
#[derive(Debug, Clone)]
pub enum Profile {
    Hod,
    Faculty(faculty::Model),
    Student(student::Model),
}

/// A fully resolved caller: session identity, role and profile row.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub profile: Profile,
}

impl Identity {
    pub fn is_hod(&self) -> bool {
        self.role == Role::Hod
    }

    pub fn faculty(&self) -> Option<&faculty::Model> {
        match &self.profile {
            Profile::Faculty(f) => Some(f),
            _ => None,
        }
    }

    pub fn student(&self) -> Option<&student::Model> {
        match &self.profile {
            Profile::Student(s) => Some(s),
            _ => None,
        }
    }
}

/// Look up the role of a session by email.
///
/// Store failures are treated as `Unknown` so the caller is denied, but the cause
/// is logged.
pub async fn resolve_role<C: ConnectionTrait>(conn: &C, email: &str) -> RoleResolution {
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await;

    match found {
        Ok(Some(user)) => match Role::parse(&user.role) {
            Some(role) => RoleResolution::Known { user, role },
            None => {
                tracing::warn!(user_id = %user.id, role = %user.role, "Unrecognised role string");
                RoleResolution::Unknown
            }
        },
        Ok(None) => {
            tracing::debug!(email, "No users row for session email");
            RoleResolution::Unknown
        }
        Err(e) => {
            tracing::warn!(email, error = %e, "Role lookup failed");
            RoleResolution::Unknown
        }
    }
}

/// Load the profile row required by `role`. `None` when it is missing, or when a
/// faculty profile is deactivated.
pub async fn resolve_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    role: Role,
) -> Option<Profile> {
    match load_profile(conn, user_id, role).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(%user_id, role = %role, error = %e, "Profile lookup failed");
            None
        }
    }
}

async fn load_profile<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    role: Role,
) -> Result<Option<Profile>, DbErr> {
    Ok(match role {
        Role::Hod => Some(Profile::Hod),
        Role::Faculty | Role::BatchCoordinator => faculty::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .filter(|f| {
                if !f.active_status {
                    tracing::debug!(%user_id, "Faculty profile is deactivated");
                }
                f.active_status
            })
            .map(Profile::Faculty),
        Role::Student => student::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .map(Profile::Student),
    })
}
