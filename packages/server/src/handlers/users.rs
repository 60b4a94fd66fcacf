use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use tracing::instrument;
use uuid::Uuid;

use crate::access::{policy, require};
use crate::entity::{faculty, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Session;
use crate::extractors::json::AppJson;
use crate::identity::{AuthError, Role};
use crate::models::user::{UpdateRoleRequest, UserListQuery, UserResponse, parse_role};
use crate::repository::{classes, faculty as faculty_repo, students, users};
use crate::state::AppState;
use crate::utils::deadline::with_deadline;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List user accounts",
    description = "HOD only. Optionally filtered by role; any spelling of a role is accepted.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 400, description = "Unknown role (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, query))]
pub async fn list_users(
    session: Session,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    require(&state, &session, policy::HOD).await?;
    let role = query.role.as_deref().map(parse_role).transpose()?;
    let rows = users::list(&state.db, role).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "Users",
    operation_id = "updateUserRole",
    summary = "Change a user's role",
    description = "HOD only. The target role must match the profile rows the user has: faculty and batch coordinators need a faculty row, students a student row. A coordinator still assigned to a class cannot be demoted.",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Role does not fit the profile (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session, payload), fields(id = %id))]
pub async fn update_user_role(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let caller = require(&state, &session, policy::HOD).await?;
    let role = parse_role(&payload.role)?;
    let user = users::find(&state.db, id).await?;

    if caller.user_id == id && role != Role::Hod {
        return Err(AppError::Conflict("You cannot change your own role".into()));
    }
    let has_profile = match role {
        Role::Faculty | Role::BatchCoordinator => faculty::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .is_some(),
        Role::Student => student::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .is_some(),
        Role::Hod => true,
    };
    if !has_profile {
        return Err(AppError::Conflict(format!("User has no {role} profile")));
    }
    if role != Role::BatchCoordinator
        && let Some(class) = classes::coordinated_by(&state.db, id).await?
    {
        return Err(AppError::Conflict(format!(
            "User still coordinates class {}",
            class.name
        )));
    }

    users::set_role(&state.db, id, role).await?;
    tracing::info!(user_id = %id, from = %user.role, to = %role, "Role changed");
    Ok(Json(users::find(&state.db, id).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user account",
    description = "HOD only. Removes the profile rows for the user's role and then the login itself.",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Forbidden (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Cannot delete yourself (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, session), fields(id = %id))]
pub async fn delete_user(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let caller = require(&state, &session, policy::HOD).await?;
    if caller.user_id == id {
        return Err(AppError::Conflict("You cannot delete your own account".into()));
    }
    let user = users::find(&state.db, id).await?;

    with_deadline(state.request_timeout(), async {
        match Role::parse(&user.role) {
            Some(Role::Student) => {
                students::delete(&state.db, id).await?;
            }
            Some(Role::Faculty | Role::BatchCoordinator) => {
                faculty_repo::delete(&state.db, id).await?;
            }
            _ => {
                users::delete(&state.db, id).await?;
            }
        }
        match state.identities.delete_identity(id).await {
            Ok(()) | Err(AuthError::IdentityNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
