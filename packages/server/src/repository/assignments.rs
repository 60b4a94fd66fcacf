use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::{assignment, assignment_submission, student, subject};
use crate::error::AppError;
use crate::models::assignment::{CreateAssignmentRequest, UpdateAssignmentRequest};

#[derive(Debug, Default, Clone)]
pub struct AssignmentFilter {
    pub class_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub created_by: Option<Uuid>,
}

pub async fn list<C: ConnectionTrait>(
    conn: &C,
    filter: AssignmentFilter,
) -> Result<Vec<assignment::Model>, AppError> {
    let mut query = assignment::Entity::find();
    if let Some(class_id) = filter.class_id {
        query = query.filter(assignment::Column::ClassId.eq(class_id));
    }
    if let Some(subject_id) = filter.subject_id {
        query = query.filter(assignment::Column::SubjectId.eq(subject_id));
    }
    if let Some(created_by) = filter.created_by {
        query = query.filter(assignment::Column::CreatedBy.eq(created_by));
    }
    Ok(query
        .order_by_asc(assignment::Column::DueDate)
        .order_by_asc(assignment::Column::Id)
        .all(conn)
        .await?)
}

pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<assignment::Model, AppError> {
    assignment::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".into()))
}

/// Create an assignment and one pending submission per student currently in the class.
///
/// Students enrolled later get no submission row.
pub async fn create(
    db: &DatabaseConnection,
    subject: &subject::Model,
    created_by: Uuid,
    req: &CreateAssignmentRequest,
) -> Result<(assignment::Model, u64), AppError> {
    let txn = db.begin().await?;

    let model = assignment::ActiveModel {
        subject_id: Set(subject.id),
        class_id: Set(subject.class_id),
        title: Set(req.title.trim().to_string()),
        description: Set(req.description.trim().to_string()),
        due_date: Set(req.due_date),
        max_score: Set(req.max_score),
        created_by: Set(created_by),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let student_ids: Vec<Uuid> = student::Entity::find()
        .select_only()
        .column(student::Column::Id)
        .filter(student::Column::ClassId.eq(subject.class_id))
        .into_tuple()
        .all(&txn)
        .await?;

    let fan_out = student_ids.len() as u64;
    if !student_ids.is_empty() {
        let rows = student_ids
            .into_iter()
            .map(|student_id| assignment_submission::ActiveModel {
                assignment_id: Set(model.id),
                student_id: Set(student_id),
                status: Set(false),
                file_url: Set(None),
                score: Set(None),
                submitted_at: Set(None),
                ..Default::default()
            });
        assignment_submission::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    tracing::info!(assignment_id = model.id, submissions = fan_out, "Created assignment");
    Ok((model, fan_out))
}

pub async fn update<C: ConnectionTrait>(
    conn: &C,
    existing: assignment::Model,
    req: &UpdateAssignmentRequest,
) -> Result<assignment::Model, AppError> {
    let mut active = existing.into_active_model();
    if let Some(title) = &req.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = &req.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(due_date) = req.due_date {
        active.due_date = Set(due_date);
    }
    if let Some(max_score) = req.max_score {
        active.max_score = Set(max_score);
    }
    Ok(active.update(conn).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;
    assignment_submission::Entity::delete_many()
        .filter(assignment_submission::Column::AssignmentId.eq(id))
        .exec(&txn)
        .await?;
    let res = assignment::Entity::delete_by_id(id).exec(&txn).await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Assignment not found".into()));
    }
    txn.commit().await?;
    Ok(())
}

/// Submissions of an assignment, each paired with its student when still enrolled.
pub async fn submissions<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i32,
) -> Result<Vec<(assignment_submission::Model, Option<student::Model>)>, AppError> {
    let rows = assignment_submission::Entity::find()
        .filter(assignment_submission::Column::AssignmentId.eq(assignment_id))
        .order_by_asc(assignment_submission::Column::Id)
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|s| s.student_id).collect();
    let mut students: HashMap<Uuid, student::Model> = student::Entity::find()
        .filter(student::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    Ok(rows
        .into_iter()
        .map(|s| {
            let student = students.remove(&s.student_id);
            (s, student)
        })
        .collect())
}

pub async fn submissions_of_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
) -> Result<Vec<assignment_submission::Model>, AppError> {
    Ok(assignment_submission::Entity::find()
        .filter(assignment_submission::Column::StudentId.eq(student_id))
        .all(conn)
        .await?)
}

pub async fn find_submission<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<assignment_submission::Model, AppError> {
    assignment_submission::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))
}

pub async fn find_submissions<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> Result<Vec<assignment_submission::Model>, AppError> {
    Ok(assignment_submission::Entity::find()
        .filter(assignment_submission::Column::Id.is_in(ids.to_vec()))
        .all(conn)
        .await?)
}

pub async fn grade<C: ConnectionTrait>(
    conn: &C,
    submission: assignment_submission::Model,
    max_score: i32,
    status: Option<bool>,
    score: Option<Option<i32>>,
) -> Result<assignment_submission::Model, AppError> {
    if let Some(Some(score)) = score
        && !(0..=max_score).contains(&score)
    {
        return Err(AppError::Validation(format!(
            "Score must be between 0 and {max_score}"
        )));
    }
    let mut active = submission.into_active_model();
    if let Some(status) = status {
        active.status = Set(status);
    }
    if let Some(score) = score {
        active.score = Set(score);
    }
    Ok(active.update(conn).await?)
}

/// Set `status` on several submissions at once.
pub async fn set_status_bulk<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
    status: bool,
) -> Result<u64, AppError> {
    let res = assignment_submission::Entity::update_many()
        .col_expr(assignment_submission::Column::Status, Expr::value(status))
        .filter(assignment_submission::Column::Id.is_in(ids.to_vec()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

/// A student hands in their own submission.
pub async fn submit<C: ConnectionTrait>(
    conn: &C,
    submission: assignment_submission::Model,
    file_url: Option<String>,
) -> Result<assignment_submission::Model, AppError> {
    let mut active = submission.into_active_model();
    active.status = Set(true);
    active.file_url = Set(file_url);
    active.submitted_at = Set(Some(Utc::now()));
    Ok(active.update(conn).await?)
}
