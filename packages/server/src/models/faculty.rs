use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{required_text, validate_email, validate_phone};
use crate::entity::faculty;
use crate::error::AppError;

/// Request body for adding a faculty member.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateFacultyRequest {
    #[schema(example = "Anita Raj")]
    pub name: String,
    #[schema(example = "anita@sngist.org")]
    pub email: String,
    /// Exactly 10 digits.
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "CS")]
    pub department: String,
}

/// Validated, normalised faculty fields.
#[derive(Debug, Clone)]
pub struct NewFaculty {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
}

impl CreateFacultyRequest {
    pub fn validate(&self) -> Result<NewFaculty, AppError> {
        Ok(NewFaculty {
            name: required_text(&self.name, "Name", 128)?,
            email: validate_email(&self.email)?,
            phone: validate_phone(&self.phone)?,
            department: required_text(&self.department, "Department", 64)?,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FacultyResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub active_status: bool,
    pub created_at: DateTime<Utc>,
}

impl From<faculty::Model> for FacultyResponse {
    fn from(m: faculty::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            department: m.department,
            active_status: m.active_status,
            created_at: m.created_at,
        }
    }
}

/// Result of AddFaculty. The password is shown once and never stored in clear.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateFacultyResponse {
    pub faculty: FacultyResponse,
    #[schema(example = "Welcome@123")]
    pub initial_password: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FacultyListQuery {
    /// Filter on `active_status`.
    pub active: Option<bool>,
}

/// PATCH body; email is fixed once provisioned.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateFacultyRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

impl UpdateFacultyRequest {
    pub fn validate(&self) -> Result<FacultyPatch, AppError> {
        Ok(FacultyPatch {
            name: self
                .name
                .as_deref()
                .map(|v| required_text(v, "Name", 128))
                .transpose()?,
            phone: self.phone.as_deref().map(validate_phone).transpose()?,
            department: self
                .department
                .as_deref()
                .map(|v| required_text(v, "Department", 64))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default)]
pub struct FacultyPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct FacultyStatusRequest {
    pub active_status: bool,
}
