use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;
use uuid::Uuid;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::identity::AuthError;
use crate::models::faculty::{
    CreateFacultyRequest, CreateFacultyResponse, FacultyListQuery, FacultyResponse,
    FacultyStatusRequest, UpdateFacultyRequest,
};
use crate::repository::faculty as faculty_repo;
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::workflows::provisioning::{self, ProvisioningContext};

#[utoipa::path(
    get,
    path = "/faculty",
    tag = "Faculty",
    operation_id = "listFaculty",
    summary = "List faculty members",
    params(FacultyListQuery),
    responses(
        (status = 200, description = "Faculty members", body = Vec<FacultyResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_faculty(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<FacultyListQuery>,
) -> Result<Json<Vec<FacultyResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let rows = faculty_repo::list(&state.db, query.active).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/faculty",
    tag = "Faculty",
    operation_id = "addFaculty",
    summary = "Add a faculty member",
    description = "HOD only. Creates the login with the institution's fixed initial password, then the user and faculty rows. The password is returned once. If the rows cannot be written after the login exists, the response is PARTIAL_PROVISIONING and the login is listed for reconciliation.",
    request_body = CreateFacultyRequest,
    responses(
        (status = 201, description = "Faculty added", body = CreateFacultyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 409, description = "Email already registered (DUPLICATE)", body = ErrorBody),
        (status = 500, description = "Login created without profile (PARTIAL_PROVISIONING)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(email = %payload.email))]
pub async fn add_faculty(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFacultyRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&state, &session, policy::HOD).await?;
    let input = payload.validate()?;

    let ctx = ProvisioningContext::from_state(&state);
    let provisioned = provisioning::add_faculty(&ctx, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateFacultyResponse {
            faculty: provisioned.faculty.into(),
            initial_password: provisioned.initial_password,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/faculty/{id}",
    tag = "Faculty",
    operation_id = "getFaculty",
    summary = "Get a faculty member",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    responses(
        (status = 200, description = "Faculty member", body = FacultyResponse),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = %id))]
pub async fn get_faculty(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FacultyResponse>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    Ok(Json(faculty_repo::find(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/faculty/{id}",
    tag = "Faculty",
    operation_id = "updateFaculty",
    summary = "Edit a faculty member's details",
    description = "HOD only. Name, phone and department may change; the email is fixed.",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    request_body = UpdateFacultyRequest,
    responses(
        (status = 200, description = "Faculty updated", body = FacultyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = %id))]
pub async fn update_faculty(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateFacultyRequest>,
) -> Result<Json<FacultyResponse>, AppError> {
    require(&state, &session, policy::HOD).await?;
    let patch = payload.validate()?;
    Ok(Json(faculty_repo::update(&state.db, id, patch).await?.into()))
}

#[utoipa::path(
    put,
    path = "/faculty/{id}/status",
    tag = "Faculty",
    operation_id = "setFacultyStatus",
    summary = "Activate or deactivate a faculty member",
    description = "HOD only. Deactivated faculty keep their data but are refused by every faculty route.",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    request_body = FacultyStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = FacultyResponse),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = %id, active = payload.active_status))]
pub async fn set_faculty_status(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<FacultyStatusRequest>,
) -> Result<Json<FacultyResponse>, AppError> {
    require(&state, &session, policy::HOD).await?;
    let model = faculty_repo::set_status(&state.db, id, payload.active_status).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/faculty/{id}",
    tag = "Faculty",
    operation_id = "deleteFaculty",
    summary = "Remove a faculty member",
    description = "HOD only. Their subjects become unassigned, their class loses its coordinator, and their login is deleted.",
    params(("id" = Uuid, Path, description = "Faculty ID")),
    responses(
        (status = 204, description = "Faculty removed"),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = %id))]
pub async fn delete_faculty(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require(&state, &session, policy::HOD).await?;
    with_deadline(state.request_timeout(), async {
        faculty_repo::delete(&state.db, id).await?;
        match state.identities.delete_identity(id).await {
            Ok(()) | Err(AuthError::IdentityNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
