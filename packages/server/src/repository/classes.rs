use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{faculty as faculty_repo, users};
use crate::entity::{
    assignment, assignment_submission, attendance, class, internal_marks, student, subject, user,
};
use crate::error::AppError;
use crate::identity::{IdentityProvider, Role};
use crate::models::class::{ClassDeleteSummary, CreateClassRequest, UpdateClassRequest};

pub async fn list<C: ConnectionTrait>(conn: &C) -> Result<Vec<class::Model>, AppError> {
    Ok(class::Entity::find()
        .order_by_desc(class::Column::BatchYearStart)
        .order_by_asc(class::Column::Name)
        .all(conn)
        .await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<class::Model, AppError> {
    class::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".into()))
}

pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, AppError> {
    Ok(class::Entity::find().count(conn).await?)
}

/// The class a faculty member coordinates, if any.
pub async fn coordinated_by<C: ConnectionTrait>(
    conn: &C,
    faculty_id: Uuid,
) -> Result<Option<class::Model>, AppError> {
    Ok(class::Entity::find()
        .filter(class::Column::BatchCoordinatorId.eq(faculty_id))
        .one(conn)
        .await?)
}

/// Move the coordinator designation of `class_id` from `old` to `new`.
///
/// The new coordinator must be an active faculty member without another class and is
/// promoted to `batch_coordinator`; the previous one is demoted back to `faculty`.
async fn designate<C: ConnectionTrait>(
    conn: &C,
    class_id: Option<i32>,
    old: Option<Uuid>,
    new: Option<Uuid>,
) -> Result<(), AppError> {
    if old == new {
        return Ok(());
    }
    if let Some(new) = new {
        let faculty = faculty_repo::find(conn, new).await?;
        if !faculty.active_status {
            return Err(AppError::Conflict(
                "A deactivated faculty member cannot coordinate a class".into(),
            ));
        }
        if let Some(other) = coordinated_by(conn, new).await?
            && Some(other.id) != class_id
        {
            return Err(AppError::Conflict(format!(
                "{} already coordinates class {}",
                faculty.name, other.name
            )));
        }
        users::set_role(conn, new, Role::BatchCoordinator).await?;
    }
    if let Some(old) = old {
        demote(conn, old).await?;
    }
    Ok(())
}

async fn demote<C: ConnectionTrait>(conn: &C, faculty_id: Uuid) -> Result<(), AppError> {
    let is_coordinator = user::Entity::find_by_id(faculty_id)
        .one(conn)
        .await?
        .is_some_and(|u| Role::parse(&u.role) == Some(Role::BatchCoordinator));
    if is_coordinator {
        users::set_role(conn, faculty_id, Role::Faculty).await?;
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    req: &CreateClassRequest,
) -> Result<class::Model, AppError> {
    let txn = db.begin().await?;
    designate(&txn, None, None, req.batch_coordinator_id).await?;

    let model = class::ActiveModel {
        name: Set(req.name.trim().to_string()),
        department: Set(req.department.trim().to_string()),
        batch_year_start: Set(req.batch_year_start),
        batch_year_end: Set(req.batch_year_end),
        batch_coordinator_id: Set(req.batch_coordinator_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    req: &UpdateClassRequest,
) -> Result<class::Model, AppError> {
    let txn = db.begin().await?;
    let existing = find(&txn, id).await?;
    req.validate(&existing)?;

    if let Some(new) = req.batch_coordinator_id {
        designate(&txn, Some(id), existing.batch_coordinator_id, new).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(name) = &req.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(department) = &req.department {
        active.department = Set(department.trim().to_string());
    }
    if let Some(start) = req.batch_year_start {
        active.batch_year_start = Set(start);
    }
    if let Some(end) = req.batch_year_end {
        active.batch_year_end = Set(end);
    }
    if let Some(coordinator) = req.batch_coordinator_id {
        active.batch_coordinator_id = Set(coordinator);
    }
    let model = active.update(&txn).await?;

    txn.commit().await?;
    Ok(model)
}

/// Delete a class and everything hanging off it in one transaction.
///
/// Attendance, marks, submissions, assignments, subjects and students (with their
/// `users` rows) go first, then the class. Student auth identities are removed after
/// the commit; a failure there is logged and leaves the identity behind.
pub async fn delete(
    db: &DatabaseConnection,
    identities: &dyn IdentityProvider,
    id: i32,
) -> Result<ClassDeleteSummary, AppError> {
    let txn = db.begin().await?;
    let class = find(&txn, id).await?;

    let student_ids: Vec<Uuid> = student::Entity::find()
        .select_only()
        .column(student::Column::Id)
        .filter(student::Column::ClassId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    let subject_ids: Vec<i32> = subject::Entity::find()
        .select_only()
        .column(subject::Column::Id)
        .filter(subject::Column::ClassId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    let assignment_ids: Vec<i32> = assignment::Entity::find()
        .select_only()
        .column(assignment::Column::Id)
        .filter(
            assignment::Column::ClassId
                .eq(id)
                .or(assignment::Column::SubjectId.is_in(subject_ids.clone())),
        )
        .into_tuple()
        .all(&txn)
        .await?;

    attendance::Entity::delete_many()
        .filter(
            attendance::Column::SubjectId
                .is_in(subject_ids.clone())
                .or(attendance::Column::StudentId.is_in(student_ids.clone())),
        )
        .exec(&txn)
        .await?;
    internal_marks::Entity::delete_many()
        .filter(
            internal_marks::Column::SubjectId
                .is_in(subject_ids.clone())
                .or(internal_marks::Column::StudentId.is_in(student_ids.clone())),
        )
        .exec(&txn)
        .await?;
    assignment_submission::Entity::delete_many()
        .filter(
            assignment_submission::Column::AssignmentId
                .is_in(assignment_ids.clone())
                .or(assignment_submission::Column::StudentId.is_in(student_ids.clone())),
        )
        .exec(&txn)
        .await?;
    assignment::Entity::delete_many()
        .filter(assignment::Column::Id.is_in(assignment_ids.clone()))
        .exec(&txn)
        .await?;
    subject::Entity::delete_many()
        .filter(subject::Column::ClassId.eq(id))
        .exec(&txn)
        .await?;
    student::Entity::delete_many()
        .filter(student::Column::ClassId.eq(id))
        .exec(&txn)
        .await?;
    user::Entity::delete_many()
        .filter(user::Column::Id.is_in(student_ids.clone()))
        .exec(&txn)
        .await?;

    if let Some(coordinator) = class.batch_coordinator_id {
        demote(&txn, coordinator).await?;
    }
    class::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    for student_id in &student_ids {
        if let Err(e) = identities.delete_identity(*student_id).await {
            tracing::warn!(%student_id, error = %e, "Could not delete student identity");
        }
    }

    tracing::info!(
        class_id = id,
        students = student_ids.len(),
        subjects = subject_ids.len(),
        "Deleted class"
    );
    Ok(ClassDeleteSummary {
        students: student_ids.len() as u64,
        subjects: subject_ids.len() as u64,
        assignments: assignment_ids.len() as u64,
    })
}
