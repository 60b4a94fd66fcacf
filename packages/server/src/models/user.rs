use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::identity::Role;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Only users with this role.
    pub role: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    /// Canonical role string as stored.
    #[schema(example = "faculty")]
    pub role: String,
    pub department: Option<String>,
    pub class_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            role: m.role,
            department: m.department,
            class_id: m.class_id,
            created_at: m.created_at,
        }
    }
}

/// Request body for an administrative role change.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "batch_coordinator")]
    pub role: String,
}

pub fn parse_role(raw: &str) -> Result<Role, AppError> {
    Role::parse(raw).ok_or_else(|| AppError::Validation(format!("Unknown role `{}`", raw.trim())))
}
