//! Authentication middleware: bearer token extraction and identity resolution.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use quill_core::auth::principal::AuthenticatedIdentity;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Identity resolved for the current request, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthenticatedIdentity);

/// Raw bearer token the request was authenticated with.
#[derive(Clone)]
pub struct BearerToken(pub String);

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let Some(header) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        debug!("missing authorization header");
        return Err(AppError::authentication_required());
    };
    match header.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => {
            debug!("unsupported authorization scheme");
            Err(AppError::authentication_required())
        }
    }
}

/// Axum middleware: verifies the bearer token, reloads its account and
/// injects [`AuthenticatedUser`] and [`BearerToken`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_owned();
    let identity = state.gateway.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(identity));
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}
