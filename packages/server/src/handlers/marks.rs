use axum::{
    Json,
    extract::{Query, State},
};
use sea_orm::TransactionTrait;
use tracing::instrument;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::models::marks::{MarksQuery, MarksResponse, SaveMarksRequest, SaveMarksResponse};
use crate::repository::marks as marks_repo;
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::workflows::marks::save_internal_marks;

#[utoipa::path(
    get,
    path = "/internal-marks",
    tag = "Internal Marks",
    operation_id = "listInternalMarks",
    summary = "Read internal marks",
    params(MarksQuery),
    responses(
        (status = 200, description = "One row per student and subject", body = Vec<MarksResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_marks(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<MarksQuery>,
) -> Result<Json<Vec<MarksResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let rows = marks_repo::list(&state.db, query.subject_id, query.student_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/internal-marks",
    tag = "Internal Marks",
    operation_id = "saveInternalMarks",
    summary = "Save one internal assessment for a subject",
    description = "Writes only the chosen assessment slot and keeps the other one. Blank marks store \"not graded\"; non-blank marks must lie in 0..max_marks.",
    request_body = SaveMarksRequest,
    responses(
        (status = 200, description = "Marks saved", body = SaveMarksResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject not found (NOT_FOUND)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, session, payload),
    fields(subject_id = payload.subject_id, assessment = ?payload.assessment_type)
)]
pub async fn save_marks(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveMarksRequest>,
) -> Result<Json<SaveMarksResponse>, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    let saved = with_deadline(state.request_timeout(), async {
        let txn = state.db.begin().await?;
        let saved = save_internal_marks(&txn, &caller, payload.into()).await?;
        txn.commit().await?;
        Ok(saved)
    })
    .await?;
    Ok(Json(SaveMarksResponse { saved }))
}
