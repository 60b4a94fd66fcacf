use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An auth identity left behind by a provisioning workflow that failed
/// after the identity was created.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "provisioning_failure")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `add_faculty` or `add_student`.
    pub workflow: String,
    pub identity_id: Uuid,
    pub email: String,
    pub failed_step: String,
    pub error_message: String,

    pub resolved: bool,
    pub resolved_at: Option<DateTimeUtc>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
