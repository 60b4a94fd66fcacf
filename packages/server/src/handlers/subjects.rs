use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::models::subject::{
    CreateSubjectRequest, SubjectListQuery, SubjectResponse, UpdateSubjectRequest,
};
use crate::repository::subjects;
use crate::state::AppState;
use crate::utils::deadline::with_deadline;

#[utoipa::path(
    get,
    path = "/subjects",
    tag = "Subjects",
    operation_id = "listSubjects",
    summary = "List subjects",
    params(SubjectListQuery),
    responses(
        (status = 200, description = "Subjects", body = Vec<SubjectResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_subjects(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> Result<Json<Vec<SubjectResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let rows = subjects::list(&state.db, query.class_id, query.faculty_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/subjects",
    tag = "Subjects",
    operation_id = "createSubject",
    summary = "Add a subject to a class",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Class or faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(class_id = payload.class_id))]
pub async fn create_subject(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&state, &session, policy::HOD).await?;
    let model = subjects::create(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/subjects/{id}",
    tag = "Subjects",
    operation_id = "updateSubject",
    summary = "Rename a subject or change its faculty",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Subject or faculty not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = id))]
pub async fn update_subject(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateSubjectRequest>,
) -> Result<Json<SubjectResponse>, AppError> {
    require(&state, &session, policy::HOD).await?;
    Ok(Json(subjects::update(&state.db, id, &payload).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/subjects/{id}",
    tag = "Subjects",
    operation_id = "deleteSubject",
    summary = "Delete a subject",
    description = "HOD only. The subject's attendance, internal marks and assignments go with it.",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn delete_subject(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    require(&state, &session, policy::HOD).await?;
    with_deadline(state.request_timeout(), subjects::delete(&state.db, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
