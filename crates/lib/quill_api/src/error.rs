//! Application error types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quill_core::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ApiResponse;

/// Message returned for any failed login.
pub const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Message returned for any rejected bearer token.
pub const AUTHENTICATION_REQUIRED: &str = "Full authentication is required to access this resource";

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn authentication_required() -> Self {
        AppError::Unauthorized(AUTHENTICATION_REQUIRED.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.as_str()),
            AppError::DbUnavailable(m) => {
                error!(detail = %m, "database unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable")
            }
            AppError::Internal(m) => {
                error!(detail = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::DbUnavailable(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Every token, credential and account rejection becomes the same
/// client-facing 401. The detailed kind is only logged.
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized(BAD_CREDENTIALS.into()),
            e if e.is_rejection() => {
                warn!(error = %e, "authentication rejected");
                AppError::authentication_required()
            }
            AuthError::ValidationError(msg) => AppError::Validation(msg),
            AuthError::DbError(e) => AppError::from(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_collapse_to_one_message() {
        for e in [
            AuthError::Malformed("bad base64".into()),
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::AccountNotFound(7),
            AuthError::AccountDisabled(7),
        ] {
            match AppError::from(e) {
                AppError::Unauthorized(m) => assert_eq!(m, AUTHENTICATION_REQUIRED),
                other => panic!("unexpected mapping: {other:?}"),
            }
        }
    }

    #[test]
    fn bad_credentials_keep_login_message() {
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::Unauthorized(m) if m == BAD_CREDENTIALS
        ));
    }

    #[test]
    fn server_faults_are_not_unauthorized() {
        assert!(matches!(
            AppError::from(AuthError::Encoding("no key".into())),
            AppError::Internal(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::DbError(sqlx::Error::PoolTimedOut)),
            AppError::DbUnavailable(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::ValidationError("Username is already taken".into())),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::authentication_required().into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Validation("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
