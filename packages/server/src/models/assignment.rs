use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, required_text};
use crate::entity::{assignment, assignment_submission, student};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    pub subject_id: i32,
    #[schema(example = "Linked lists")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = "2024-09-30")]
    pub due_date: NaiveDate,
    #[schema(example = 10)]
    pub max_score: i32,
}

fn validate_max_score(max_score: i32) -> Result<(), AppError> {
    if !(1..=1000).contains(&max_score) {
        return Err(AppError::Validation(
            "Maximum score must be between 1 and 1000".into(),
        ));
    }
    Ok(())
}

impl CreateAssignmentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        required_text(&self.title, "Title", 256)?;
        validate_max_score(self.max_score)
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub max_score: Option<i32>,
}

impl UpdateAssignmentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            required_text(title, "Title", 256)?;
        }
        if let Some(max_score) = self.max_score {
            validate_max_score(max_score)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AssignmentListQuery {
    pub class_id: Option<i32>,
    pub subject_id: Option<i32>,
    /// Creator's user id.
    pub created_by: Option<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub subject_id: i32,
    pub class_id: i32,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub max_score: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<assignment::Model> for AssignmentResponse {
    fn from(m: assignment::Model) -> Self {
        Self {
            id: m.id,
            subject_id: m.subject_id,
            class_id: m.class_id,
            title: m.title,
            description: m.description,
            due_date: m.due_date,
            max_score: m.max_score,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateAssignmentResponse {
    pub assignment: AssignmentResponse,
    /// One pending submission per student enrolled at creation time.
    pub submissions_created: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub assignment_id: i32,
    pub student_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_of_student: Option<String>,
    /// `true` once submitted.
    pub status: bool,
    pub file_url: Option<String>,
    pub score: Option<i32>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl SubmissionResponse {
    pub fn with_student(
        m: assignment_submission::Model,
        student: Option<&student::Model>,
    ) -> Self {
        Self {
            reg_no: student.map(|s| s.reg_no.clone()),
            name_of_student: student.map(|s| s.name_of_student.clone()),
            ..Self::from(m)
        }
    }
}

impl From<assignment_submission::Model> for SubmissionResponse {
    fn from(m: assignment_submission::Model) -> Self {
        Self {
            id: m.id,
            assignment_id: m.assignment_id,
            student_id: m.student_id,
            reg_no: None,
            name_of_student: None,
            status: m.status,
            file_url: m.file_url,
            score: m.score,
            submitted_at: m.submitted_at,
        }
    }
}

/// Faculty grading of one submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct GradeSubmissionRequest {
    pub status: Option<bool>,
    /// `null` clears the score.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub score: Option<Option<i32>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BulkSubmissionStatusRequest {
    pub submission_ids: Vec<i32>,
    pub status: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BulkSubmissionStatusResponse {
    pub updated: u64,
}

/// A student's own hand-in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitAssignmentRequest {
    #[schema(example = "https://files.sngist.org/sgi22cs001/ll.pdf")]
    pub file_url: Option<String>,
}
