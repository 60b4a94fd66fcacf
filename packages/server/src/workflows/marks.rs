use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attendance::ensure_enrolled;
use crate::access::ownership;
use crate::entity::internal_marks;
use crate::error::AppError;
use crate::identity::Identity;
use crate::repository::{classes, marks as marks_repo, subjects};

/// Which internal assessment a save writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Internal1,
    Internal2,
}

/// Build the row to store for one entry.
///
/// Only the slot named by `assessment` takes `value`; the sibling slot keeps whatever
/// `existing` holds, or NULL when there is no row yet.
pub fn merge_marks(
    existing: Option<&internal_marks::Model>,
    student_id: Uuid,
    subject_id: i32,
    assessment: AssessmentType,
    value: Option<f64>,
    max_marks: f64,
    now: DateTime<Utc>,
) -> internal_marks::Model {
    let internal1 = existing.and_then(|m| m.internal1_marks);
    let internal2 = existing.and_then(|m| m.internal2_marks);
    let (internal1_marks, internal2_marks) = match assessment {
        AssessmentType::Internal1 => (value, internal2),
        AssessmentType::Internal2 => (internal1, value),
    };
    internal_marks::Model {
        student_id,
        subject_id,
        internal1_marks,
        internal2_marks,
        max_marks,
        updated_at: now,
    }
}

pub fn validate_marks(max_marks: f64, entries: &[(Uuid, Option<f64>)]) -> Result<(), AppError> {
    if !max_marks.is_finite() || max_marks <= 0.0 {
        return Err(AppError::Validation(
            "Maximum marks must be greater than zero".into(),
        ));
    }
    for (student_id, marks) in entries {
        if let Some(m) = marks
            && !(m.is_finite() && (0.0..=max_marks).contains(m))
        {
            return Err(AppError::Validation(format!(
                "Marks for student {student_id} must be between 0 and {max_marks}"
            )));
        }
    }
    Ok(())
}

/// A stored row shares one `max_marks` between both slots, so the slot a save keeps
/// must still fit the new maximum.
pub fn check_kept_slot(
    existing: &internal_marks::Model,
    assessment: AssessmentType,
    max_marks: f64,
) -> Result<(), AppError> {
    let (kept, label) = match assessment {
        AssessmentType::Internal1 => (existing.internal2_marks, "internal2"),
        AssessmentType::Internal2 => (existing.internal1_marks, "internal1"),
    };
    match kept {
        Some(m) if m > max_marks => Err(AppError::Validation(format!(
            "Stored {label} marks of {m} for student {} exceed the new maximum of {max_marks}",
            existing.student_id
        ))),
        _ => Ok(()),
    }
}

/// One SaveInternalMarks call.
#[derive(Debug, Clone)]
pub struct MarksSheet {
    pub subject_id: i32,
    pub assessment: AssessmentType,
    pub max_marks: f64,
    pub entries: Vec<(Uuid, Option<f64>)>,
}

/// Read-before-write save of one assessment slot for a subject.
pub async fn save_internal_marks<C: ConnectionTrait>(
    conn: &C,
    caller: &Identity,
    sheet: MarksSheet,
) -> Result<usize, AppError> {
    if sheet.entries.is_empty() {
        return Err(AppError::Validation("No marks to save".into()));
    }
    validate_marks(sheet.max_marks, &sheet.entries)?;

    let subject = subjects::find(conn, sheet.subject_id).await?;
    let class = classes::find(conn, subject.class_id).await?;
    ownership::ensure_subject_writer(caller, &subject, &class)?;

    // Last entry wins for a repeated student.
    let latest: HashMap<Uuid, Option<f64>> = sheet.entries.iter().copied().collect();
    let ids: Vec<Uuid> = latest.keys().copied().collect();
    ensure_enrolled(conn, class.id, &ids).await?;

    let existing: HashMap<Uuid, internal_marks::Model> = internal_marks::Entity::find()
        .filter(internal_marks::Column::SubjectId.eq(subject.id))
        .filter(internal_marks::Column::StudentId.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.student_id, m))
        .collect();
    for row in existing.values() {
        check_kept_slot(row, sheet.assessment, sheet.max_marks)?;
    }

    let now = Utc::now();
    let rows: Vec<internal_marks::Model> = latest
        .iter()
        .map(|(student_id, value)| {
            merge_marks(
                existing.get(student_id),
                *student_id,
                subject.id,
                sheet.assessment,
                *value,
                sheet.max_marks,
                now,
            )
        })
        .collect();
    let saved = rows.len();
    marks_repo::upsert_many(conn, rows).await?;

    tracing::info!(
        subject_id = subject.id,
        assessment = ?sheet.assessment,
        saved,
        "Saved internal marks"
    );
    Ok(saved)
}
