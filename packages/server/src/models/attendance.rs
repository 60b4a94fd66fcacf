use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::blank_as_none;
use crate::entity::attendance;
use crate::workflows::attendance::AttendanceSheet;

/// One student's cell on the attendance sheet.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AttendanceEntry {
    pub student_id: Uuid,
    /// Percentage; blank or `null` entries are skipped. Out-of-range values are clamped.
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>, example = 87.5)]
    pub percentage: Option<f64>,
}

/// Request body for SaveAttendance.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SaveAttendanceRequest {
    pub class_id: i32,
    pub subject_id: i32,
    /// English month name, any case.
    #[schema(example = "August")]
    pub month: String,
    pub entries: Vec<AttendanceEntry>,
}

impl From<SaveAttendanceRequest> for AttendanceSheet {
    fn from(req: SaveAttendanceRequest) -> Self {
        Self {
            class_id: req.class_id,
            subject_id: req.subject_id,
            month: req.month,
            entries: req
                .entries
                .into_iter()
                .map(|e| (e.student_id, e.percentage))
                .collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SaveAttendanceResponse {
    pub saved: usize,
    /// Blank entries left untouched.
    pub skipped: usize,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AttendanceQuery {
    pub class_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub student_id: Option<Uuid>,
    pub month: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttendanceResponse {
    pub student_id: Uuid,
    pub subject_id: i32,
    pub class_id: i32,
    pub month: String,
    pub attendance_percentage: f64,
    pub faculty_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl From<attendance::Model> for AttendanceResponse {
    fn from(m: attendance::Model) -> Self {
        Self {
            student_id: m.student_id,
            subject_id: m.subject_id,
            class_id: m.class_id,
            month: m.month,
            attendance_percentage: m.attendance_percentage,
            faculty_id: m.faculty_id,
            updated_at: m.updated_at,
        }
    }
}
