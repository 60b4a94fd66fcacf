use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// The caller's session, extracted from the `Authorization: Bearer <token>` header.
///
/// A request without the header is `Anonymous`; the access guard decides what that
/// means for the route. A malformed, expired or revoked token is rejected outright.
#[derive(Debug, Clone)]
pub enum Session {
    Anonymous,
    Authenticated {
        identity_id: Uuid,
        email: String,
        session_id: Uuid,
    },
}

impl Session {
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { session_id, .. } => Some(*session_id),
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get("Authorization") else {
            return Ok(Session::Anonymous);
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let live = state
            .identities
            .current_session(claims.sid)
            .await?
            .filter(|s| s.identity_id == claims.uid)
            .ok_or(AppError::TokenInvalid)?;

        Ok(Session::Authenticated {
            identity_id: live.identity_id,
            email: live.email,
            session_id: claims.sid,
        })
    }
}
