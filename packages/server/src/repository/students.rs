use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::users;
use crate::entity::{assignment_submission, attendance, internal_marks, student, user};
use crate::error::AppError;
use crate::models::student::StudentPatch;

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    class_id: Option<i32>,
    coordinator_id: Option<Uuid>,
) -> Result<Vec<student::Model>, AppError> {
    let mut query = student::Entity::find();
    if let Some(class_id) = class_id {
        query = query.filter(student::Column::ClassId.eq(class_id));
    }
    if let Some(coordinator_id) = coordinator_id {
        query = query.filter(student::Column::BatchCoordinatorId.eq(coordinator_id));
    }
    Ok(query.order_by_asc(student::Column::RegNo).all(conn).await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, AppError> {
    Ok(student::Entity::find().count(conn).await?)
}

pub async fn reg_no_exists<C: ConnectionTrait>(conn: &C, reg_no: &str) -> Result<bool, AppError> {
    let count = student::Entity::find()
        .filter(student::Column::RegNo.eq(reg_no))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: StudentPatch,
) -> Result<student::Model, AppError> {
    let txn = db.begin().await?;
    let mut active = find(&txn, id).await?.into_active_model();
    if let Some(name) = &patch.name_of_student {
        active.name_of_student = Set(name.clone());
        users::set_full_name(&txn, id, name).await?;
    }
    if let Some(phone) = patch.phone {
        active.phone = Set(phone);
    }
    if let Some(address) = patch.address {
        active.address = Set(address);
    }
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

/// Delete a student's profile rows and records. The auth identity is left to the caller.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<student::Model, AppError> {
    let txn = db.begin().await?;
    let existing = find(&txn, id).await?;

    attendance::Entity::delete_many()
        .filter(attendance::Column::StudentId.eq(id))
        .exec(&txn)
        .await?;
    internal_marks::Entity::delete_many()
        .filter(internal_marks::Column::StudentId.eq(id))
        .exec(&txn)
        .await?;
    assignment_submission::Entity::delete_many()
        .filter(assignment_submission::Column::StudentId.eq(id))
        .exec(&txn)
        .await?;
    student::Entity::delete_by_id(id).exec(&txn).await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(student_id = %id, "Deleted student profile");
    Ok(existing)
}
