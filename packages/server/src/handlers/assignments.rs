use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::access::ownership::ensure_subject_writer;
use crate::access::{policy, require};
use crate::entity::assignment;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::identity::Identity;
use crate::models::assignment::{
    AssignmentListQuery, AssignmentResponse, BulkSubmissionStatusRequest,
    BulkSubmissionStatusResponse, CreateAssignmentRequest, CreateAssignmentResponse,
    GradeSubmissionRequest, SubmissionResponse, UpdateAssignmentRequest,
};
use crate::models::shared::validate_bulk_ids;
use crate::repository::assignments::{self, AssignmentFilter};
use crate::repository::{classes, subjects};
use crate::state::AppState;
use crate::utils::deadline::with_deadline;

const MAX_BULK_SUBMISSIONS: usize = 500;

/// Check that the caller may write to the subject an assignment belongs to.
async fn ensure_assignment_writer(
    state: &AppState,
    caller: &Identity,
    assignment: &assignment::Model,
) -> Result<(), AppError> {
    let subject = subjects::find(&state.db, assignment.subject_id).await?;
    let class = classes::find(&state.db, subject.class_id).await?;
    ensure_subject_writer(caller, &subject, &class)
}

#[utoipa::path(
    get,
    path = "/assignments",
    tag = "Assignments",
    operation_id = "listAssignments",
    summary = "List assignments",
    description = "Filter by class, subject or creator. Ordered by due date.",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "Assignments", body = Vec<AssignmentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_assignments(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<AssignmentListQuery>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let rows = assignments::list(
        &state.db,
        AssignmentFilter {
            class_id: query.class_id,
            subject_id: query.subject_id,
            created_by: query.created_by,
        },
    )
    .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/assignments",
    tag = "Assignments",
    operation_id = "createAssignment",
    summary = "Publish an assignment",
    description = "Allowed for the HOD, the subject's faculty and the class coordinator. One pending submission is created for every student currently in the class.",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = CreateAssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(subject_id = payload.subject_id))]
pub async fn create_assignment(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    payload.validate()?;

    let subject = subjects::find(&state.db, payload.subject_id).await?;
    let class = classes::find(&state.db, subject.class_id).await?;
    ensure_subject_writer(&caller, &subject, &class)?;

    let (model, submissions_created) = with_deadline(
        state.request_timeout(),
        assignments::create(&state.db, &subject, caller.user_id, &payload),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAssignmentResponse {
            assignment: model.into(),
            submissions_created,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "Assignments",
    operation_id = "getAssignment",
    summary = "Get an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment", body = AssignmentResponse),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn get_assignment(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AssignmentResponse>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    Ok(Json(assignments::find(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/assignments/{id}",
    tag = "Assignments",
    operation_id = "updateAssignment",
    summary = "Edit an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = id))]
pub async fn update_assignment(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAssignmentRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    payload.validate()?;
    let existing = assignments::find(&state.db, id).await?;
    ensure_assignment_writer(&state, &caller, &existing).await?;
    Ok(Json(
        assignments::update(&state.db, existing, &payload)
            .await?
            .into(),
    ))
}

#[utoipa::path(
    delete,
    path = "/assignments/{id}",
    tag = "Assignments",
    operation_id = "deleteAssignment",
    summary = "Delete an assignment and its submissions",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn delete_assignment(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    let existing = assignments::find(&state.db, id).await?;
    ensure_assignment_writer(&state, &caller, &existing).await?;
    with_deadline(state.request_timeout(), assignments::delete(&state.db, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/assignments/{id}/submissions",
    tag = "Assignments",
    operation_id = "listSubmissions",
    summary = "List the submissions of an assignment",
    params(("id" = i32, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submissions with student details", body = Vec<SubmissionResponse>),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Assignment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn list_submissions(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    assignments::find(&state.db, id).await?;
    let rows = assignments::submissions(&state.db, id).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(submission, student)| SubmissionResponse::with_student(submission, student.as_ref()))
            .collect(),
    ))
}

#[utoipa::path(
    patch,
    path = "/submissions/{id}",
    tag = "Assignments",
    operation_id = "gradeSubmission",
    summary = "Grade a submission",
    description = "Sets the submitted flag and/or the score. A score must lie within the assignment's maximum.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = GradeSubmissionRequest,
    responses(
        (status = 200, description = "Submission updated", body = SubmissionResponse),
        (status = 400, description = "Score out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = id))]
pub async fn grade_submission(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<GradeSubmissionRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    let submission = assignments::find_submission(&state.db, id).await?;
    let assignment = assignments::find(&state.db, submission.assignment_id).await?;
    ensure_assignment_writer(&state, &caller, &assignment).await?;

    let model = assignments::grade(
        &state.db,
        submission,
        assignment.max_score,
        payload.status,
        payload.score,
    )
    .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/submissions/status",
    tag = "Assignments",
    operation_id = "setSubmissionStatus",
    summary = "Mark several submissions at once",
    description = "Every listed submission must exist and belong to an assignment the caller may write.",
    request_body = BulkSubmissionStatusRequest,
    responses(
        (status = 200, description = "Submissions updated", body = BulkSubmissionStatusResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(count = payload.submission_ids.len(), status = payload.status))]
pub async fn set_submission_status(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkSubmissionStatusRequest>,
) -> Result<Json<BulkSubmissionStatusResponse>, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    validate_bulk_ids(&payload.submission_ids, "submission_ids", MAX_BULK_SUBMISSIONS)?;

    let ids: BTreeSet<i32> = payload.submission_ids.iter().copied().collect();
    let ids: Vec<i32> = ids.into_iter().collect();
    let found = assignments::find_submissions(&state.db, &ids).await?;
    if found.len() != ids.len() {
        return Err(AppError::NotFound("One or more submissions not found".into()));
    }

    let assignment_ids: BTreeSet<i32> = found.iter().map(|s| s.assignment_id).collect();
    for assignment_id in assignment_ids {
        let assignment = assignments::find(&state.db, assignment_id).await?;
        ensure_assignment_writer(&state, &caller, &assignment).await?;
    }

    let updated = assignments::set_status_bulk(&state.db, &ids, payload.status).await?;
    Ok(Json(BulkSubmissionStatusResponse { updated }))
}
