//! Authentication and authorization logic.
//!
//! Token issuance and verification, expiry decisions, principal
//! resolution and the login/refresh flows. Shared by `quill_api` and any
//! other consumer that needs to authenticate a bearer token.

pub mod clock;
pub mod codec;
pub mod expiry;
pub mod gateway;
pub mod password;
pub mod principal;
pub mod settings;

use thiserror::Error;

use crate::models::auth::AccountId;

/// Authentication errors.
///
/// `Display` carries the detailed diagnostic meant for logs. The HTTP
/// layer decides what, if anything, of it reaches clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Account {0} is disabled")]
    AccountDisabled(AccountId),

    #[error("Token encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error is a rejection of the presented token or
    /// credential (as opposed to a server-side fault).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::Malformed(_)
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::AccountNotFound(_)
                | AuthError::AccountDisabled(_)
        )
    }
}
