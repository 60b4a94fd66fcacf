use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use super::{classes, users};
use crate::entity::{class, faculty, subject, user};
use crate::error::AppError;
use crate::models::faculty::FacultyPatch;

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    active: Option<bool>,
) -> Result<Vec<faculty::Model>, AppError> {
    let mut query = faculty::Entity::find();
    if let Some(active) = active {
        query = query.filter(faculty::Column::ActiveStatus.eq(active));
    }
    Ok(query.order_by_asc(faculty::Column::Name).all(conn).await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<faculty::Model, AppError> {
    faculty::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Faculty not found".into()))
}

pub async fn count_by_status<C: ConnectionTrait>(conn: &C, active: bool) -> Result<u64, AppError> {
    Ok(faculty::Entity::find()
        .filter(faculty::Column::ActiveStatus.eq(active))
        .count(conn)
        .await?)
}

pub async fn email_exists<C: ConnectionTrait>(conn: &C, email: &str) -> Result<bool, AppError> {
    let count = faculty::Entity::find()
        .filter(faculty::Column::Email.eq(email))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Apply a validated patch, mirroring name and department onto the `users` row.
pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    patch: FacultyPatch,
) -> Result<faculty::Model, AppError> {
    let txn = db.begin().await?;
    let existing = find(&txn, id).await?;

    let mut active = existing.into_active_model();
    if let Some(name) = &patch.name {
        active.name = Set(name.clone());
        users::set_full_name(&txn, id, name).await?;
    }
    if let Some(phone) = patch.phone {
        active.phone = Set(phone);
    }
    if let Some(department) = &patch.department {
        active.department = Set(department.clone());
        user::Entity::update_many()
            .col_expr(user::Column::Department, Expr::value(department.clone()))
            .filter(user::Column::Id.eq(id))
            .exec(&txn)
            .await?;
    }
    let model = active.update(&txn).await?;
    txn.commit().await?;
    Ok(model)
}

pub async fn set_status<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    active_status: bool,
) -> Result<faculty::Model, AppError> {
    let mut active = find(conn, id).await?.into_active_model();
    active.active_status = Set(active_status);
    Ok(active.update(conn).await?)
}

/// Delete a faculty member's profile rows.
///
/// Their subjects become unassigned and their class loses its coordinator. The auth
/// identity is left to the caller.
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), AppError> {
    let txn = db.begin().await?;
    find(&txn, id).await?;

    subject::Entity::update_many()
        .col_expr(subject::Column::FacultyId, Expr::value(Option::<Uuid>::None))
        .filter(subject::Column::FacultyId.eq(id))
        .exec(&txn)
        .await?;
    if let Some(class) = classes::coordinated_by(&txn, id).await? {
        class::Entity::update_many()
            .col_expr(class::Column::BatchCoordinatorId, Expr::value(Option::<Uuid>::None))
            .filter(class::Column::Id.eq(class.id))
            .exec(&txn)
            .await?;
    }
    faculty::Entity::delete_by_id(id).exec(&txn).await?;
    user::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(faculty_id = %id, "Deleted faculty profile");
    Ok(())
}
