use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::attendance;
use crate::error::AppError;

#[derive(Debug, Default, Clone)]
pub struct AttendanceFilter {
    pub class_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub student_id: Option<Uuid>,
    /// Canonical month name.
    pub month: Option<String>,
}

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    filter: AttendanceFilter,
) -> Result<Vec<attendance::Model>, AppError> {
    let mut query = attendance::Entity::find();
    if let Some(class_id) = filter.class_id {
        query = query.filter(attendance::Column::ClassId.eq(class_id));
    }
    if let Some(subject_id) = filter.subject_id {
        query = query.filter(attendance::Column::SubjectId.eq(subject_id));
    }
    if let Some(student_id) = filter.student_id {
        query = query.filter(attendance::Column::StudentId.eq(student_id));
    }
    if let Some(month) = filter.month {
        query = query.filter(attendance::Column::Month.eq(month));
    }
    Ok(query
        .order_by_asc(attendance::Column::SubjectId)
        .order_by_asc(attendance::Column::StudentId)
        .all(conn)
        .await?)
}

/// Insert or overwrite rows on their (student, subject, month) key.
pub async fn upsert_many<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<attendance::Model>,
) -> Result<(), DbErr> {
    if rows.is_empty() {
        return Ok(());
    }
    attendance::Entity::insert_many(rows.into_iter().map(attendance::ActiveModel::from))
        .on_conflict(
            OnConflict::columns([
                attendance::Column::StudentId,
                attendance::Column::SubjectId,
                attendance::Column::Month,
            ])
            .update_columns([
                attendance::Column::ClassId,
                attendance::Column::AttendancePercentage,
                attendance::Column::FacultyId,
                attendance::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
