use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly attendance percentage, keyed by (student, subject, month).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub subject_id: i32,
    /// Capitalised English month name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub month: String,

    pub class_id: i32,
    pub attendance_percentage: f64,
    /// Faculty who last wrote the row.
    pub faculty_id: Uuid,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl ActiveModelBehavior for ActiveModel {}
