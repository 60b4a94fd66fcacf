use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, required_text};
use crate::entity::subject;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubjectRequest {
    #[schema(example = "Data Structures")]
    pub name: String,
    pub class_id: i32,
    /// Leave out to create the subject unassigned.
    pub faculty_id: Option<Uuid>,
}

impl CreateSubjectRequest {
    pub fn validate(&self) -> Result<String, AppError> {
        required_text(&self.name, "Subject name", 128)
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    /// `null` unassigns the subject.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub faculty_id: Option<Option<Uuid>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubjectListQuery {
    pub class_id: Option<i32>,
    pub faculty_id: Option<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectResponse {
    pub id: i32,
    pub name: String,
    pub class_id: i32,
    pub faculty_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<subject::Model> for SubjectResponse {
    fn from(m: subject::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            class_id: m.class_id,
            faculty_id: m.faculty_id,
            created_at: m.created_at,
        }
    }
}
