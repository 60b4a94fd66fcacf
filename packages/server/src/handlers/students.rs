use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;
use uuid::Uuid;

use crate::access::ownership::ensure_class_manager;
use crate::access::{policy, require};
use crate::entity::student;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::identity::{AuthError, Identity};
use crate::models::student::{
    CreateStudentRequest, CreateStudentResponse, StudentListQuery, StudentResponse,
    UpdateStudentRequest,
};
use crate::repository::{classes, students};
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::workflows::provisioning::{self, ProvisioningContext};

/// Load a student the caller may manage: HOD, or the coordinator of the student's class.
async fn managed_student(
    state: &AppState,
    caller: &Identity,
    id: Uuid,
) -> Result<student::Model, AppError> {
    let student = students::find(&state.db, id).await?;
    let class = classes::find(&state.db, student.class_id).await?;
    ensure_class_manager(caller, &class)?;
    Ok(student)
}

#[utoipa::path(
    get,
    path = "/students",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students",
    description = "The HOD sees every student matching the filters; a batch coordinator only sees their own class.",
    params(StudentListQuery),
    responses(
        (status = 200, description = "Students ordered by registration number", body = Vec<StudentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_students(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    let coordinator_id = if caller.is_hod() {
        query.coordinator_id
    } else {
        Some(caller.user_id)
    };
    let rows = students::list(&state.db, query.class_id, coordinator_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/students",
    tag = "Students",
    operation_id = "addStudent",
    summary = "Add a student to a coordinator's class",
    description = "The login email is the lowercased registration number at the institution domain and the initial password is the date of birth as DDMMYYYY; both are returned once. A batch coordinator always adds to their own class; an HOD must name the coordinator. If the rows cannot be written after the login exists, the response is PARTIAL_PROVISIONING and the login is listed for reconciliation.",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student added", body = CreateStudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Coordinator or class not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Registration number or login taken (DUPLICATE)", body = ErrorBody),
        (status = 500, description = "Login created without profile (PARTIAL_PROVISIONING)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(reg_no = %payload.reg_no))]
pub async fn add_student(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    let coordinator_id = if caller.is_hod() {
        payload.coordinator_id.ok_or_else(|| {
            AppError::Validation("coordinator_id is required when an HOD adds a student".into())
        })?
    } else {
        caller.user_id
    };
    let input = payload.validate()?;

    let ctx = ProvisioningContext::from_state(&state);
    let provisioned = provisioning::add_student(&ctx, coordinator_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateStudentResponse {
            student: provisioned.student.into(),
            email: provisioned.email,
            initial_password: provisioned.initial_password,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = StudentResponse),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = %id))]
pub async fn get_student(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentResponse>, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    Ok(Json(managed_student(&state, &caller, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/students/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Edit a student's details",
    description = "Registration number and date of birth are fixed because the login derives from them.",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = %id))]
pub async fn update_student(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    let patch = payload.validate()?;
    managed_student(&state, &caller, id).await?;
    Ok(Json(students::update(&state.db, id, patch).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Remove a student",
    description = "Deletes the student's attendance, marks, submissions, profile and login.",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student removed"),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = %id))]
pub async fn delete_student(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    managed_student(&state, &caller, id).await?;

    with_deadline(state.request_timeout(), async {
        students::delete(&state.db, id).await?;
        match state.identities.delete_identity(id).await {
            Ok(()) | Err(AuthError::IdentityNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
