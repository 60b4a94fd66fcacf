use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::identity::Role;

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    role: Option<Role>,
) -> Result<Vec<user::Model>, AppError> {
    let mut query = user::Entity::find();
    if let Some(role) = role {
        query = query.filter(user::Column::Role.eq(role.as_str()));
    }
    Ok(query.order_by_asc(user::Column::FullName).all(conn).await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn email_exists<C: ConnectionTrait>(conn: &C, email: &str) -> Result<bool, AppError> {
    let count = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(conn)
        .await?;
    Ok(count > 0)
}

pub async fn count_by_role<C: ConnectionTrait>(conn: &C, role: Role) -> Result<u64, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Role.eq(role.as_str()))
        .count(conn)
        .await?)
}

pub async fn insert<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    email: &str,
    full_name: &str,
    role: Role,
    department: Option<String>,
    class_id: Option<i32>,
) -> Result<user::Model, sea_orm::DbErr> {
    user::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        full_name: Set(full_name.to_string()),
        role: Set(role.as_str().to_string()),
        department: Set(department),
        class_id: Set(class_id),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(conn)
    .await
}

/// Store `role` in canonical form. Missing rows are ignored.
pub async fn set_role<C: ConnectionTrait>(conn: &C, id: Uuid, role: Role) -> Result<(), AppError> {
    user::Entity::update_many()
        .col_expr(user::Column::Role, Expr::value(role.as_str()))
        .filter(user::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn set_full_name<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    full_name: &str,
) -> Result<(), AppError> {
    user::Entity::update_many()
        .col_expr(user::Column::FullName, Expr::value(full_name))
        .filter(user::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), AppError> {
    let res = user::Entity::delete_by_id(id).exec(conn).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    Ok(())
}
