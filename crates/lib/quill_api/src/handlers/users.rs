//! Account handlers for the authenticated caller.

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ApiResponse, ChangePasswordRequest, UserResponse};

/// `GET /users/me`: summary of the authenticated account.
pub async fn me_handler(
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    Ok(Json(ApiResponse::ok(
        "Current user",
        identity.summary().into(),
    )))
}

/// `DELETE /users/me`: deactivate the caller's account.
pub async fn deactivate_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.gateway.deactivate(&identity).await?;
    Ok(Json(ApiResponse::done("Account deactivated")))
}

/// `PUT /users/me/password`: change password, re-checking the current one.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    WithRejection(Json(body), _): WithRejection<Json<ChangePasswordRequest>, AppError>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .gateway
        .change_password(&identity, body.current_password, body.new_password)
        .await?;
    Ok(Json(ApiResponse::done("Password changed")))
}
