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
use crate::models::reconciliation::{ProvisioningFailureResponse, ReconciliationQuery};
use crate::repository::reconciliation::{ReconciliationService, ResolveResult};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/reconciliation",
    tag = "Reconciliation",
    operation_id = "listProvisioningFailures",
    summary = "List logins left without a profile",
    description = "HOD only. Each entry names the workflow and step that failed after the login was created. Unresolved entries are returned unless `resolved` says otherwise.",
    params(ReconciliationQuery),
    responses(
        (status = 200, description = "Provisioning failures, newest first", body = Vec<ProvisioningFailureResponse>),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_failures(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<ReconciliationQuery>,
) -> Result<Json<Vec<ProvisioningFailureResponse>>, AppError> {
    require(&state, &session, policy::HOD).await?;
    let rows = ReconciliationService::new(&state.db)
        .list(Some(query.resolved.unwrap_or(false)))
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/reconciliation/{id}/resolve",
    tag = "Reconciliation",
    operation_id = "resolveProvisioningFailure",
    summary = "Mark a provisioning failure as handled",
    params(("id" = i32, Path, description = "Failure ID")),
    responses(
        (status = 204, description = "Marked resolved"),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Failure not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already resolved (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = id))]
pub async fn resolve_failure(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::HOD).await?;
    match ReconciliationService::new(&state.db)
        .resolve(id, caller.user_id)
        .await?
    {
        ResolveResult::Resolved => {
            tracing::info!(failure_id = id, resolved_by = %caller.user_id, "Provisioning failure resolved");
            Ok(StatusCode::NO_CONTENT)
        }
        ResolveResult::NotFound => Err(AppError::NotFound("Provisioning failure not found".into())),
        ResolveResult::AlreadyResolved => Err(AppError::Conflict(
            "Provisioning failure is already resolved".into(),
        )),
    }
}
