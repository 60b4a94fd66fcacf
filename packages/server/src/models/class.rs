use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, required_text};
use crate::entity::class;
use crate::error::AppError;

/// Request body for creating a class.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateClassRequest {
    #[schema(example = "CS-2022")]
    pub name: String,
    #[schema(example = "CS")]
    pub department: String,
    #[schema(example = 2022)]
    pub batch_year_start: i32,
    #[schema(example = 2026)]
    pub batch_year_end: i32,
    /// Faculty to designate as batch coordinator.
    pub batch_coordinator_id: Option<Uuid>,
}

pub fn validate_batch_years(start: i32, end: i32) -> Result<(), AppError> {
    if !(1900..=2200).contains(&start) || !(1900..=2200).contains(&end) {
        return Err(AppError::Validation(
            "Batch years must be between 1900 and 2200".into(),
        ));
    }
    if end <= start {
        return Err(AppError::Validation(
            "Batch end year must be after the start year".into(),
        ));
    }
    Ok(())
}

impl CreateClassRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        required_text(&self.name, "Class name", 64)?;
        required_text(&self.department, "Department", 64)?;
        validate_batch_years(self.batch_year_start, self.batch_year_end)
    }
}

/// PATCH body for a class.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub batch_year_start: Option<i32>,
    pub batch_year_end: Option<i32>,
    /// `null` removes the coordinator.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub batch_coordinator_id: Option<Option<Uuid>>,
}

impl UpdateClassRequest {
    /// Validate against the stored row, so one-sided year updates stay ordered.
    pub fn validate(&self, existing: &class::Model) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            required_text(name, "Class name", 64)?;
        }
        if let Some(department) = &self.department {
            required_text(department, "Department", 64)?;
        }
        validate_batch_years(
            self.batch_year_start.unwrap_or(existing.batch_year_start),
            self.batch_year_end.unwrap_or(existing.batch_year_end),
        )
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassResponse {
    pub id: i32,
    pub name: String,
    pub department: String,
    pub batch_year_start: i32,
    pub batch_year_end: i32,
    pub batch_coordinator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<class::Model> for ClassResponse {
    fn from(m: class::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            department: m.department,
            batch_year_start: m.batch_year_start,
            batch_year_end: m.batch_year_end,
            batch_coordinator_id: m.batch_coordinator_id,
            created_at: m.created_at,
        }
    }
}

/// What a cascading class delete removed.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct ClassDeleteSummary {
    pub students: u64,
    pub subjects: u64,
    pub assignments: u64,
}
