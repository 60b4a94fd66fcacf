use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::blank_as_none;
use crate::entity::internal_marks;
use crate::workflows::marks::{AssessmentType, MarksSheet};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct MarksEntry {
    pub student_id: Uuid,
    /// Blank or `null` stores "not graded".
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>, example = 42)]
    pub marks: Option<f64>,
}

/// Request body for SaveInternalMarks.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SaveMarksRequest {
    pub subject_id: i32,
    pub assessment_type: AssessmentType,
    #[schema(example = 50)]
    pub max_marks: f64,
    pub entries: Vec<MarksEntry>,
}

impl From<SaveMarksRequest> for MarksSheet {
    fn from(req: SaveMarksRequest) -> Self {
        Self {
            subject_id: req.subject_id,
            assessment: req.assessment_type,
            max_marks: req.max_marks,
            entries: req
                .entries
                .into_iter()
                .map(|e| (e.student_id, e.marks))
                .collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SaveMarksResponse {
    pub saved: usize,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct MarksQuery {
    pub subject_id: Option<i32>,
    pub student_id: Option<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MarksResponse {
    pub student_id: Uuid,
    pub subject_id: i32,
    pub internal1_marks: Option<f64>,
    pub internal2_marks: Option<f64>,
    pub max_marks: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<internal_marks::Model> for MarksResponse {
    fn from(m: internal_marks::Model) -> Self {
        Self {
            student_id: m.student_id,
            subject_id: m.subject_id,
            internal1_marks: m.internal1_marks,
            internal2_marks: m.internal2_marks,
            max_marks: m.max_marks,
            updated_at: m.updated_at,
        }
    }
}
