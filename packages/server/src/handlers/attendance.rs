use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::models::attendance::{
    AttendanceQuery, AttendanceResponse, SaveAttendanceRequest, SaveAttendanceResponse,
};
use crate::repository::attendance::{self as attendance_repo, AttendanceFilter};
use crate::state::AppState;
use crate::utils::deadline::with_deadline;
use crate::workflows::attendance::{normalize_month, save_attendance as save_sheet};

#[utoipa::path(
    get,
    path = "/attendance",
    tag = "Attendance",
    operation_id = "listAttendance",
    summary = "Read attendance records",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance rows", body = Vec<AttendanceResponse>),
        (status = 400, description = "Unknown month (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_attendance(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceResponse>>, AppError> {
    require(&state, &session, policy::STAFF).await?;
    let month = query
        .month
        .as_deref()
        .map(normalize_month)
        .transpose()?
        .map(str::to_string);

    let rows = attendance_repo::list(
        &state.db,
        AttendanceFilter {
            class_id: query.class_id,
            subject_id: query.subject_id,
            student_id: query.student_id,
            month,
        },
    )
    .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/attendance",
    tag = "Attendance",
    operation_id = "saveAttendance",
    summary = "Save one month of attendance for a subject",
    description = "Blank entries are skipped and percentages are clamped to 0..100. Rows are keyed by student, subject and month, so a repeat save overwrites and other months stay untouched. Allowed for the HOD, the subject's faculty and the class coordinator.",
    request_body = SaveAttendanceRequest,
    responses(
        (status = 200, description = "Attendance saved", body = SaveAttendanceResponse),
        (status = 400, description = "Nothing to save, unknown month or foreign student (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Subject or class not found (NOT_FOUND)", body = ErrorBody),
        (status = 504, description = "Timed out (TIMEOUT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, session, payload),
    fields(class_id = payload.class_id, subject_id = payload.subject_id, month = %payload.month)
)]
pub async fn save_attendance(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveAttendanceRequest>,
) -> Result<Json<SaveAttendanceResponse>, AppError> {
    let caller = require(&state, &session, policy::STAFF).await?;
    let outcome = with_deadline(
        state.request_timeout(),
        save_sheet(&state.db, &caller, payload.into()),
    )
    .await?;
    Ok(Json(SaveAttendanceResponse {
        saved: outcome.saved,
        skipped: outcome.skipped,
    }))
}
