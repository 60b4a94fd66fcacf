use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::{Identity, Role};

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "sgi22cs001@sngist.org")]
    pub email: String,
    #[schema(example = "12042005")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token for the new session.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    /// `null` when the account has no usable role.
    pub role: Option<Role>,
    /// Page to navigate to after login.
    #[schema(example = "/student/dashboard")]
    pub redirect: String,
}

/// The signed-in caller.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[schema(example = "/faculty/dashboard")]
    pub landing_route: &'static str,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            email: identity.email,
            full_name: identity.full_name,
            role: identity.role,
            landing_route: identity.role.landing_route(),
        }
    }
}

/// Request body for changing the caller's password.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    /// New password (8-128 characters).
    pub new_password: String,
}

pub fn validate_change_password(payload: &ChangePasswordRequest) -> Result<(), AppError> {
    if payload.new_password.len() < 8 || payload.new_password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if payload.new_password == payload.current_password {
        return Err(AppError::Validation(
            "New password must differ from the current one".into(),
        ));
    }
    Ok(())
}

/// Query for a route access check.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct AccessQuery {
    /// Comma-separated required roles, e.g. `hod,faculty`.
    #[param(example = "faculty,batch_coordinator")]
    pub roles: String,
}

/// Parse a comma-separated role list; unknown entries are rejected.
pub fn parse_required_roles(raw: &str) -> Result<Vec<Role>, AppError> {
    let roles = raw
        .split(',')
        .filter(|r| !r.trim().is_empty())
        .map(|r| {
            Role::parse(r).ok_or_else(|| AppError::Validation(format!("Unknown role `{}`", r.trim())))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if roles.is_empty() {
        return Err(AppError::Validation("At least one role is required".into()));
    }
    Ok(roles)
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pending,
    Allow,
    Redirect,
}

/// Guard decision for a route requiring the queried roles.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AccessResponse {
    pub decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "/unauthorized")]
    pub redirect: Option<&'static str>,
    /// Resolved role of the caller, if any.
    pub role: Option<Role>,
}
