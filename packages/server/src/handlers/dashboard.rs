use axum::{Json, extract::State};
use tracing::instrument;

use crate::access::{policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::state::AppState;
use crate::views::dashboard::{HodSummary, hod_summary};

#[utoipa::path(
    get,
    path = "/dashboard/summary",
    tag = "Dashboard",
    operation_id = "hodSummary",
    summary = "Department counts for the HOD dashboard",
    responses(
        (status = 200, description = "Counts", body = HodSummary),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn summary(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<HodSummary>, AppError> {
    require(&state, &session, policy::HOD).await?;
    Ok(Json(hod_summary(&state.db).await?))
}
