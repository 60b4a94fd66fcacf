use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::access::ownership::ensure_class_manager;
use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::models::class::{
    ClassDeleteSummary, ClassResponse, CreateClassRequest, UpdateClassRequest,
};
use crate::repository::classes;
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::views::performance::{ClassPerformance, class_performance};

#[utoipa::path(
    get,
    path = "/classes",
    tag = "Classes",
    operation_id = "listClasses",
    summary = "List classes",
    responses(
        (status = 200, description = "Classes, newest batch first", body = Vec<ClassResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn list_classes(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let rows = classes::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/classes",
    tag = "Classes",
    operation_id = "createClass",
    summary = "Create a class",
    description = "HOD only. Naming a coordinator promotes that faculty member to batch coordinator; a faculty member coordinates at most one class.",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Coordinator not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Coordinator unavailable (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(name = %payload.name))]
pub async fn create_class(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&state, &session, policy::HOD).await?;
    payload.validate()?;
    let model = classes::create(&state.db, &payload).await?;
    tracing::info!(class_id = model.id, "Created class");
    Ok((StatusCode::CREATED, Json(ClassResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "Classes",
    operation_id = "getClass",
    summary = "Get a class",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = ClassResponse),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Class not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn get_class(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClassResponse>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    Ok(Json(classes::find(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/classes/{id}",
    tag = "Classes",
    operation_id = "updateClass",
    summary = "Edit a class",
    description = "HOD only. Setting `batch_coordinator_id` to `null` removes the coordinator and demotes them back to faculty.",
    params(("id" = i32, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Class or coordinator not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Coordinator unavailable (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = id))]
pub async fn update_class(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateClassRequest>,
) -> Result<Json<ClassResponse>, AppError> {
    require(&state, &session, policy::HOD).await?;
    Ok(Json(classes::update(&state.db, id, &payload).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/classes/{id}",
    tag = "Classes",
    operation_id = "deleteClass",
    summary = "Delete a class and everything in it",
    description = "HOD only. Removes the class's subjects, assignments, attendance, internal marks and students, including the students' logins.",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class deleted", body = ClassDeleteSummary),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Class not found (NOT_FOUND)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn delete_class(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClassDeleteSummary>, AppError> {
    require(&state, &session, policy::HOD).await?;
    let summary = with_deadline(
        state.request_timeout(),
        classes::delete(&state.db, state.identities.as_ref(), id),
    )
    .await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/classes/{id}/performance",
    tag = "Classes",
    operation_id = "getClassPerformance",
    summary = "Student performance report for a class",
    description = "Per student and subject: both internals, their average over graded ones, and monthly attendance with its mean. Available to the HOD and to the class's coordinator.",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Performance report", body = ClassPerformance),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Class not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn class_performance_report(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClassPerformance>, AppError> {
    let caller = require(&state, &session, policy::ROSTER).await?;
    let class = classes::find(&state.db, id).await?;
    ensure_class_manager(&caller, &class)?;

    let report = with_deadline(state.request_timeout(), class_performance(&state.db, id)).await?;
    Ok(Json(report))
}
