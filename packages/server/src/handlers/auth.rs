use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::access::guard::evaluate;
use crate::access::{AccessDecision, GuardState, UNAUTHORIZED_ROUTE, authorize, policy, require};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::identity::{RoleResolution, normalize_email, resolve_profile, resolve_role};
use crate::models::auth::{
    AccessQuery, AccessResponse, ChangePasswordRequest, Decision, LoginRequest, LoginResponse,
    MeResponse, parse_required_roles, validate_change_password, validate_login_request,
};
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Sign in with email and password",
    description = "Opens a session and returns a bearer token. The response names the dashboard to land on; accounts whose role cannot be resolved are pointed at the unauthorized page.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let grant = state
        .identities
        .sign_in(&normalize_email(&payload.email), &payload.password)
        .await?;

    let token = jwt::sign(
        grant.identity_id,
        &grant.email,
        grant.session_id,
        grant.expires_at,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let role = match resolve_role(&state.db, &grant.email).await {
        RoleResolution::Known { user, role } if user.id == grant.identity_id => {
            resolve_profile(&state.db, user.id, role).await.map(|_| role)
        }
        _ => None,
    };

    Ok(Json(LoginResponse {
        token,
        expires_at: grant.expires_at,
        user_id: grant.identity_id,
        email: grant.email,
        role,
        redirect: role
            .map_or(UNAUTHORIZED_ROUTE, |r| r.landing_route())
            .to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "End the current session",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn logout(
    session: Session,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = session.session_id().ok_or(AppError::TokenMissing)?;
    state.identities.sign_out(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the signed-in user",
    description = "Resolves the caller's role and profile afresh on every call.",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Role unknown or profile missing (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn me(
    session: Session,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let identity = require(&state, &session, policy::ANY).await?;
    Ok(Json(identity.into()))
}

#[utoipa::path(
    post,
    path = "/auth/password",
    tag = "Auth",
    operation_id = "changePassword",
    summary = "Change the caller's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong current password or no session", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload))]
pub async fn change_password(
    session: Session,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Session::Authenticated { identity_id, .. } = session else {
        return Err(AppError::TokenMissing);
    };
    validate_change_password(&payload)?;

    state
        .identities
        .change_password(identity_id, &payload.current_password, &payload.new_password)
        .await?;
    tracing::info!(%identity_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/access",
    tag = "Auth",
    operation_id = "checkAccess",
    summary = "Evaluate the access guard for a set of roles",
    description = "Returns the guard's decision for a page requiring any of the given roles. Anonymous callers get a redirect to the login page rather than an error.",
    params(AccessQuery),
    responses(
        (status = 200, description = "Guard decision", body = AccessResponse),
        (status = 400, description = "Unknown role in query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, session, query), fields(roles = %query.roles))]
pub async fn check_access(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, AppError> {
    let required = parse_required_roles(&query.roles)?;
    let (guard_state, _) = evaluate(&state, &session).await;

    let role = match guard_state {
        GuardState::Authenticated(role) => role,
        _ => None,
    };
    let (decision, redirect) = match authorize(guard_state, &required) {
        AccessDecision::Pending => (Decision::Pending, None),
        AccessDecision::Allow => (Decision::Allow, None),
        AccessDecision::Redirect(to) => (Decision::Redirect, Some(to)),
    };
    Ok(Json(AccessResponse {
        decision,
        redirect,
        role,
    }))
}
