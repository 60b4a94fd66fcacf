use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{classes, faculty as faculty_repo};
use crate::entity::{assignment, assignment_submission, attendance, internal_marks, subject};
use crate::error::AppError;
use crate::models::subject::{CreateSubjectRequest, UpdateSubjectRequest};

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    class_id: Option<i32>,
    faculty_id: Option<Uuid>,
) -> Result<Vec<subject::Model>, AppError> {
    let mut query = subject::Entity::find();
    if let Some(class_id) = class_id {
        query = query.filter(subject::Column::ClassId.eq(class_id));
    }
    if let Some(faculty_id) = faculty_id {
        query = query.filter(subject::Column::FacultyId.eq(faculty_id));
    }
    Ok(query
        .order_by_asc(subject::Column::ClassId)
        .order_by_asc(subject::Column::Name)
        .all(conn)
        .await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<subject::Model, AppError> {
    subject::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".into()))
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, AppError> {
    Ok(subject::Entity::find().count(conn).await?)
}

pub async fn create<C: ConnectionTrait>(
    conn: &C,
    req: &CreateSubjectRequest,
) -> Result<subject::Model, AppError> {
    let name = req.validate()?;
    classes::find(conn, req.class_id).await?;
    if let Some(faculty_id) = req.faculty_id {
        faculty_repo::find(conn, faculty_id).await?;
    }

    Ok(subject::ActiveModel {
        name: Set(name),
        class_id: Set(req.class_id),
        faculty_id: Set(req.faculty_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    req: &UpdateSubjectRequest,
) -> Result<subject::Model, AppError> {
    let existing = find(conn, id).await?;
    let mut active = existing.into_active_model();
    if let Some(name) = &req.name {
        active.name = Set(crate::models::shared::required_text(name, "Subject name", 128)?);
    }
    if let Some(faculty_id) = req.faculty_id {
        if let Some(faculty_id) = faculty_id {
            faculty_repo::find(conn, faculty_id).await?;
        }
        active.faculty_id = Set(faculty_id);
    }
    Ok(active.update(conn).await?)
}

/// Delete a subject with its attendance, marks and assignments.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;
    find(&txn, id).await?;

    let assignment_ids: Vec<i32> = assignment::Entity::find()
        .select_only()
        .column(assignment::Column::Id)
        .filter(assignment::Column::SubjectId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;

    attendance::Entity::delete_many()
        .filter(attendance::Column::SubjectId.eq(id))
        .exec(&txn)
        .await?;
    internal_marks::Entity::delete_many()
        .filter(internal_marks::Column::SubjectId.eq(id))
        .exec(&txn)
        .await?;
    assignment_submission::Entity::delete_many()
        .filter(assignment_submission::Column::AssignmentId.is_in(assignment_ids))
        .exec(&txn)
        .await?;
    assignment::Entity::delete_many()
        .filter(assignment::Column::SubjectId.eq(id))
        .exec(&txn)
        .await?;
    subject::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}
