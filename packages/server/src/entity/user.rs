use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile row shared by every account, keyed by the identity id.
///
/// `role` is stored in its canonical lowercase form; see `identity::Role`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub department: Option<String>,
    /// Set for student accounts only.
    pub class_id: Option<i32>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
