use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::access::ownership;
use crate::entity::{attendance, student};
use crate::error::AppError;
use crate::identity::Identity;
use crate::repository::{attendance as attendance_repo, classes, subjects};

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Canonical month name for case-insensitive input.
pub fn normalize_month(raw: &str) -> Result<&'static str, AppError> {
    let raw = raw.trim();
    MONTHS
        .iter()
        .copied()
        .find(|m| m.eq_ignore_ascii_case(raw))
        .ok_or_else(|| AppError::Validation(format!("`{raw}` is not a month name")))
}

/// Calendar position of a canonical month name, for ordering.
pub fn month_index(month: &str) -> usize {
    MONTHS.iter().position(|m| *m == month).unwrap_or(MONTHS.len())
}

/// Clamp a raw percentage into `[0, 100]`.
pub fn clamp_percentage(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

/// Drop blank entries and clamp the rest. The last entry wins for a repeated student.
pub fn prepare_entries(entries: &[(Uuid, Option<f64>)]) -> Result<Vec<(Uuid, f64)>, AppError> {
    let mut seen = HashSet::new();
    let mut prepared: Vec<(Uuid, f64)> = Vec::new();
    for &(student_id, value) in entries.iter().rev() {
        let Some(value) = value else { continue };
        if !value.is_finite() {
            return Err(AppError::Validation(
                "Attendance percentage must be a number".into(),
            ));
        }
        if seen.insert(student_id) {
            prepared.push((student_id, clamp_percentage(value)));
        }
    }
    prepared.reverse();
    Ok(prepared)
}

/// One SaveAttendance call.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    pub class_id: i32,
    pub subject_id: i32,
    pub month: String,
    pub entries: Vec<(Uuid, Option<f64>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved: usize,
    pub skipped: usize,
}

/// Upsert one month of attendance for a subject.
///
/// Rows are keyed by (student, subject, month); other months and subjects of the
/// same students are never touched. The caller is recorded as the writer.
pub async fn save_attendance<C: ConnectionTrait>(
    conn: &C,
    caller: &Identity,
    sheet: AttendanceSheet,
) -> Result<SaveOutcome, AppError> {
    let month = normalize_month(&sheet.month)?;
    let rows = prepare_entries(&sheet.entries)?;
    if rows.is_empty() {
        return Err(AppError::Validation("No attendance data to save".into()));
    }

    let subject = subjects::find(conn, sheet.subject_id).await?;
    if subject.class_id != sheet.class_id {
        return Err(AppError::Validation(
            "Subject does not belong to this class".into(),
        ));
    }
    let class = classes::find(conn, subject.class_id).await?;
    ownership::ensure_subject_writer(caller, &subject, &class)?;

    let ids: Vec<Uuid> = rows.iter().map(|(id, _)| *id).collect();
    ensure_enrolled(conn, class.id, &ids).await?;

    let now = Utc::now();
    let models: Vec<attendance::Model> = rows
        .iter()
        .map(|&(student_id, percentage)| attendance::Model {
            student_id,
            subject_id: subject.id,
            month: month.to_string(),
            class_id: class.id,
            attendance_percentage: percentage,
            faculty_id: caller.user_id,
            updated_at: now,
        })
        .collect();
    attendance_repo::upsert_many(conn, models).await?;

    tracing::info!(
        subject_id = subject.id,
        month,
        saved = rows.len(),
        "Saved attendance"
    );
    Ok(SaveOutcome {
        saved: rows.len(),
        skipped: sheet.entries.len() - rows.len(),
    })
}

/// Every id must be a student of `class_id`.
pub async fn ensure_enrolled<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
    student_ids: &[Uuid],
) -> Result<(), AppError> {
    let enrolled: HashSet<Uuid> = student::Entity::find()
        .select_only()
        .column(student::Column::Id)
        .filter(student::Column::ClassId.eq(class_id))
        .filter(student::Column::Id.is_in(student_ids.to_vec()))
        .into_tuple::<Uuid>()
        .all(conn)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = student_ids.iter().find(|id| !enrolled.contains(id)) {
        return Err(AppError::Validation(format!(
            "Student {missing} is not enrolled in this class"
        )));
    }
    Ok(())
}
