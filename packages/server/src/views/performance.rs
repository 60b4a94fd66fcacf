use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{attendance, internal_marks, subject};
use crate::error::AppError;
use crate::models::class::ClassResponse;
use crate::repository::{classes, students, subjects};
use crate::workflows::attendance::month_index;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Serialize, utoipa::ToSchema)]
pub struct MonthlyAttendance {
    #[schema(example = "August")]
    pub month: String,
    pub percentage: f64,
}

/// Marks and attendance of one student in one subject.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectPerformance {
    pub subject_id: i32,
    pub subject_name: String,
    pub internal1: Option<f64>,
    pub internal2: Option<f64>,
    pub max_marks: Option<f64>,
    /// Mean of the graded internals.
    pub average: Option<f64>,
    #[schema(example = "42/50")]
    pub internal1_display: String,
    #[schema(example = "N/A")]
    pub internal2_display: String,
    #[schema(example = "42.0")]
    pub average_display: String,
    /// Calendar order.
    pub attendance: Vec<MonthlyAttendance>,
    pub attendance_average: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentPerformance {
    pub student_id: Uuid,
    pub reg_no: String,
    pub name_of_student: String,
    pub subjects: Vec<SubjectPerformance>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassPerformance {
    pub class: ClassResponse,
    pub students: Vec<StudentPerformance>,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Average of whichever internals are graded; ungraded ones do not count as zero.
pub fn average_of_graded(internal1: Option<f64>, internal2: Option<f64>) -> Option<f64> {
    let graded: Vec<f64> = [internal1, internal2].into_iter().flatten().collect();
    mean(&graded)
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// `42/50`, or `N/A` when ungraded.
pub fn format_mark(value: Option<f64>, max_marks: Option<f64>) -> String {
    match (value, max_marks) {
        (Some(v), Some(max)) => format!("{}/{}", trim_number(v), trim_number(max)),
        (Some(v), None) => trim_number(v),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}

/// One decimal place, or `N/A`.
pub fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}"))
}

pub fn subject_performance(
    subject: &subject::Model,
    marks: Option<&internal_marks::Model>,
    attendance: &[&attendance::Model],
) -> SubjectPerformance {
    let internal1 = marks.and_then(|m| m.internal1_marks);
    let internal2 = marks.and_then(|m| m.internal2_marks);
    let max_marks = marks.map(|m| m.max_marks);
    let average = average_of_graded(internal1, internal2);

    let mut months: Vec<MonthlyAttendance> = attendance
        .iter()
        .map(|a| MonthlyAttendance {
            month: a.month.clone(),
            percentage: a.attendance_percentage,
        })
        .collect();
    months.sort_by_key(|m| month_index(&m.month));
    let percentages: Vec<f64> = months.iter().map(|m| m.percentage).collect();

    SubjectPerformance {
        subject_id: subject.id,
        subject_name: subject.name.clone(),
        internal1,
        internal2,
        max_marks,
        average,
        internal1_display: format_mark(internal1, max_marks),
        internal2_display: format_mark(internal2, max_marks),
        average_display: format_average(average),
        attendance: months,
        attendance_average: mean(&percentages),
    }
}

/// Marks and attendance for every subject of one student.
pub async fn student_subjects<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    class_subjects: &[subject::Model],
) -> Result<Vec<SubjectPerformance>, AppError> {
    let marks = internal_marks::Entity::find()
        .filter(internal_marks::Column::StudentId.eq(student_id))
        .all(conn)
        .await?;
    let attendance = attendance::Entity::find()
        .filter(attendance::Column::StudentId.eq(student_id))
        .all(conn)
        .await?;

    Ok(class_subjects
        .iter()
        .map(|s| {
            let m = marks.iter().find(|m| m.subject_id == s.id);
            let a: Vec<&attendance::Model> =
                attendance.iter().filter(|a| a.subject_id == s.id).collect();
            subject_performance(s, m, &a)
        })
        .collect())
}

/// HOD report: every student of a class against every subject of it.
pub async fn class_performance<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
) -> Result<ClassPerformance, AppError> {
    let class = classes::find(conn, class_id).await?;
    let roster = students::list(conn, Some(class_id), None).await?;
    let class_subjects = subjects::list(conn, Some(class_id), None).await?;
    let subject_ids: Vec<i32> = class_subjects.iter().map(|s| s.id).collect();

    let marks: HashMap<(Uuid, i32), internal_marks::Model> = internal_marks::Entity::find()
        .filter(internal_marks::Column::SubjectId.is_in(subject_ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| ((m.student_id, m.subject_id), m))
        .collect();
    let mut attendance_by_key: HashMap<(Uuid, i32), Vec<attendance::Model>> = HashMap::new();
    for row in attendance::Entity::find()
        .filter(attendance::Column::SubjectId.is_in(subject_ids))
        .all(conn)
        .await?
    {
        attendance_by_key
            .entry((row.student_id, row.subject_id))
            .or_default()
            .push(row);
    }

    let students = roster
        .into_iter()
        .map(|student| {
            let subjects = class_subjects
                .iter()
                .map(|s| {
                    let key = (student.id, s.id);
                    let rows: Vec<&attendance::Model> = attendance_by_key
                        .get(&key)
                        .map(|v| v.iter().collect())
                        .unwrap_or_default();
                    subject_performance(s, marks.get(&key), &rows)
                })
                .collect();
            StudentPerformance {
                student_id: student.id,
                reg_no: student.reg_no,
                name_of_student: student.name_of_student,
                subjects,
            }
        })
        .collect();

    Ok(ClassPerformance {
        class: class.into(),
        students,
    })
}
