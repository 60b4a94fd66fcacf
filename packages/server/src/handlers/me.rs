//! Self-service pages for students and faculty.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::models::assignment::{SubmissionResponse, SubmitAssignmentRequest};
use crate::models::student::{StudentResponse, UpdateProfileRequest};
use crate::repository::{assignments, students};
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::views::dashboard::{
    FacultySubjects, StudentDashboard, faculty_subjects, student_dashboard,
};

#[utoipa::path(
    get,
    path = "/me/dashboard",
    tag = "Self Service",
    operation_id = "studentDashboard",
    summary = "The signed-in student's dashboard",
    description = "Profile, class, per-subject marks and attendance, and the class's assignments with the student's own submission.",
    responses(
        (status = 200, description = "Dashboard", body = StudentDashboard),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn dashboard(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<StudentDashboard>, AppError> {
    let caller = require(&state, &session, policy::STUDENT).await?;
    let student = caller.student().cloned().ok_or(AppError::Unauthorized)?;
    let view = with_deadline(
        state.request_timeout(),
        student_dashboard(&state.db, student),
    )
    .await?;
    Ok(Json(view))
}

#[utoipa::path(
    patch,
    path = "/me/profile",
    tag = "Self Service",
    operation_id = "updateOwnProfile",
    summary = "Update the signed-in student's phone and address",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload))]
pub async fn update_profile(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    let caller = require(&state, &session, policy::STUDENT).await?;
    let patch = payload.validate()?;
    let model = students::update(&state.db, caller.user_id, patch).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/me/submissions/{id}",
    tag = "Self Service",
    operation_id = "submitAssignment",
    summary = "Hand in an assignment",
    description = "Marks the student's own submission as submitted, optionally with a file link.",
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = SubmitAssignmentRequest,
    responses(
        (status = 200, description = "Submitted", body = SubmissionResponse),
        (status = 403, description = "Not the caller's submission (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = id))]
pub async fn submit(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitAssignmentRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let caller = require(&state, &session, policy::STUDENT).await?;
    let submission = assignments::find_submission(&state.db, id).await?;
    if submission.student_id != caller.user_id {
        return Err(AppError::PermissionDenied);
    }
    let file_url = payload
        .file_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let model = assignments::submit(&state.db, submission, file_url).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/me/subjects",
    tag = "Self Service",
    operation_id = "facultySubjects",
    summary = "Subjects assigned to the signed-in faculty member",
    description = "Each subject with its class. Coordinators also get the class they coordinate.",
    responses(
        (status = 200, description = "Assigned subjects", body = FacultySubjects),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn subjects(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<FacultySubjects>, AppError> {
    let caller = require(&state, &session, policy::FACULTY).await?;
    let faculty = caller.faculty().ok_or(AppError::Unauthorized)?;
    Ok(Json(faculty_subjects(&state.db, faculty).await?))
}
