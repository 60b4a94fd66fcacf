use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entity::internal_marks;
use crate::error::AppError;

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    subject_id: Option<i32>,
    student_id: Option<Uuid>,
) -> Result<Vec<internal_marks::Model>, AppError> {
    let mut query = internal_marks::Entity::find();
    if let Some(subject_id) = subject_id {
        query = query.filter(internal_marks::Column::SubjectId.eq(subject_id));
    }
    if let Some(student_id) = student_id {
        query = query.filter(internal_marks::Column::StudentId.eq(student_id));
    }
    Ok(query
        .order_by_asc(internal_marks::Column::SubjectId)
        .all(conn)
        .await?)
}

/// Write full rows on their (student, subject) key. Callers merge first.
pub async fn upsert_many<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<internal_marks::Model>,
) -> Result<(), DbErr> {
    if rows.is_empty() {
        return Ok(());
    }
    internal_marks::Entity::insert_many(rows.into_iter().map(internal_marks::ActiveModel::from))
        .on_conflict(
            OnConflict::columns([
                internal_marks::Column::StudentId,
                internal_marks::Column::SubjectId,
            ])
            .update_columns([
                internal_marks::Column::Internal1Marks,
                internal_marks::Column::Internal2Marks,
                internal_marks::Column::MaxMarks,
                internal_marks::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}
