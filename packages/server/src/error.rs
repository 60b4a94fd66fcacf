use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use uuid::Uuid;

use crate::access::{LOGIN_ROUTE, UNAUTHORIZED_ROUTE};
use crate::identity::AuthError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `UNAUTHORIZED`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `DUPLICATE`, `CONFLICT`, `PARTIAL_PROVISIONING`, `STORE_ERROR`,
    /// `TIMEOUT`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Phone number must be exactly 10 digits")]
    pub message: String,
    /// Page the client should navigate to, for authentication and role failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "/unauthorized")]
    pub redirect: Option<&'static str>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// Role unknown or not in the route's required set.
    Unauthorized,
    /// Role allowed, but the caller does not own the rows being touched.
    PermissionDenied,
    NotFound(String),
    /// Unique-key collision (email, registration number, ...).
    Duplicate(String),
    Conflict(String),
    /// A provisioning workflow failed after the auth identity was created.
    PartialProvisioning {
        identity_id: Uuid,
        step: &'static str,
        detail: String,
    },
    Store(String),
    Timeout,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, redirect) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                Some(LOGIN_ROUTE),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired session".into(),
                Some(LOGIN_ROUTE),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                Some(LOGIN_ROUTE),
            ),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "UNAUTHORIZED",
                "You are not authorized to access this page".into(),
                Some(UNAUTHORIZED_ROUTE),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::PartialProvisioning {
                identity_id,
                step,
                detail,
            } => {
                tracing::debug!(
                    %identity_id,
                    step,
                    detail = %detail,
                    "Responding with partial provisioning"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PARTIAL_PROVISIONING",
                    "The login was created but the profile could not be saved. \
                     An administrator must reconcile this account before retrying."
                        .into(),
                    None,
                )
            }
            AppError::Store(detail) => {
                tracing::error!("Store error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "The records store could not complete the request".into(),
                    None,
                )
            }
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "The request timed out; check the data before retrying".into(),
                None,
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };
        (
            status,
            ErrorBody {
                code,
                message,
                redirect,
            },
        )
    }

    /// Map a unique-constraint violation to `Duplicate`, anything else to `Store`.
    pub fn from_insert(err: DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Unique constraint caught on insert of {what}");
                AppError::Duplicate(format!("{what} already exists"))
            }
            _ => AppError::from(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::EmailTaken(email) => {
                AppError::Duplicate(format!("An account with email {email} already exists"))
            }
            AuthError::IdentityNotFound => AppError::NotFound("Identity not found".into()),
            AuthError::Hash(detail) => AppError::Internal(format!("Password hash error: {detail}")),
            AuthError::Store(e) => AppError::from(e),
        }
    }
}
