use super::{LOGIN_ROUTE, UNAUTHORIZED_ROUTE};
use crate::error::AppError;
use crate::extractors::auth::Session;
use crate::identity::{Identity, Role, RoleResolution, resolve_profile, resolve_role};
use crate::state::AppState;

/// What the guard knows about the caller at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Identity resolution still in flight.
    Loading,
    Anonymous,
    /// `None` when the role is unknown or its profile row is missing.
    Authenticated(Option<Role>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render a neutral placeholder, never protected content.
    Pending,
    Allow,
    Redirect(&'static str),
}

/// Decide access for `state` against the route's required roles.
///
/// Allow iff the resolved role is in `required`. Anonymous callers go to the login
/// page; everyone else who is denied goes to the unauthorized page.
pub fn authorize(state: GuardState, required: &[Role]) -> AccessDecision {
    match state {
        GuardState::Loading => AccessDecision::Pending,
        GuardState::Anonymous => AccessDecision::Redirect(LOGIN_ROUTE),
        GuardState::Authenticated(Some(role)) if required.contains(&role) => AccessDecision::Allow,
        GuardState::Authenticated(_) => AccessDecision::Redirect(UNAUTHORIZED_ROUTE),
    }
}

/// Resolve the session into a guard state, returning the identity when one exists.
///
/// Runs on every request; nothing is cached between calls.
pub async fn evaluate(state: &AppState, session: &Session) -> (GuardState, Option<Identity>) {
    let Session::Authenticated {
        identity_id, email, ..
    } = session
    else {
        return (GuardState::Anonymous, None);
    };

    let RoleResolution::Known { user, role } = resolve_role(&state.db, email).await else {
        return (GuardState::Authenticated(None), None);
    };

    if user.id != *identity_id {
        tracing::warn!(
            %identity_id,
            user_id = %user.id,
            "users row email matches a different identity"
        );
        return (GuardState::Authenticated(None), None);
    }

    match resolve_profile(&state.db, user.id, role).await {
        Some(profile) => (
            GuardState::Authenticated(Some(role)),
            Some(Identity {
                user_id: user.id,
                email: user.email,
                full_name: user.full_name,
                role,
                profile,
            }),
        ),
        None => {
            tracing::debug!(user_id = %user.id, role = %role, "Missing profile row");
            (GuardState::Authenticated(None), None)
        }
    }
}

/// Gate a handler on `required`, returning the resolved caller.
pub async fn require(
    state: &AppState,
    session: &Session,
    required: &[Role],
) -> Result<Identity, AppError> {
    let (guard_state, identity) = evaluate(state, session).await;
    match (authorize(guard_state, required), identity) {
        (AccessDecision::Allow, Some(identity)) => Ok(identity),
        (AccessDecision::Redirect(LOGIN_ROUTE), _) => Err(AppError::TokenMissing),
        _ => {
            tracing::info!(?guard_state, ?required, "Access denied");
            Err(AppError::Unauthorized)
        }
    }
}
