//! Authentication request handlers.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{BearerToken, bearer_token};
use crate::models::{
    ApiResponse, AuthResponse, AvailabilityResponse, EmailQuery, LoginRequest, RegisterRequest,
    TokenStatusResponse, UserResponse, UsernameQuery,
};

/// `POST /auth/login`: authenticate with email-or-username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let session = state.gateway.login(body.into()).await?;
    Ok(Json(ApiResponse::ok("Login successful", session.into())))
}

/// `POST /auth/register`: create a new, not yet verified account.
pub async fn register_handler(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let summary = state.gateway.register(body.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Registration successful", summary.into())),
    ))
}

/// `GET /auth/check-email?email=`
pub async fn check_email_handler(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<EmailQuery>, AppError>,
) -> AppResult<Json<ApiResponse<AvailabilityResponse>>> {
    let available = state.gateway.is_email_available(&query.email).await?;
    Ok(Json(ApiResponse::ok(
        if available {
            "Email is available"
        } else {
            "Email is already registered"
        },
        AvailabilityResponse { available },
    )))
}

/// `GET /auth/check-username?username=`
pub async fn check_username_handler(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UsernameQuery>, AppError>,
) -> AppResult<Json<ApiResponse<AvailabilityResponse>>> {
    let available = state.gateway.is_username_available(&query.username).await?;
    Ok(Json(ApiResponse::ok(
        if available {
            "Username is available"
        } else {
            "Username is already taken"
        },
        AvailabilityResponse { available },
    )))
}

/// `POST /auth/refresh`: trade the bearer token for a fresh one.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let token = bearer_token(&headers)?;
    let session = state.gateway.refresh(token).await?;
    Ok(Json(ApiResponse::ok("Token refreshed", session.into())))
}

/// `POST /auth/logout`: tokens are stateless, the client drops its copy.
pub async fn logout_handler(State(state): State<AppState>) -> Json<ApiResponse<()>> {
    state.gateway.logout();
    Json(ApiResponse::done("Logout successful"))
}

/// `GET /auth/token-status`: expiry of the presented token.
pub async fn token_status_handler(
    State(state): State<AppState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> AppResult<Json<ApiResponse<TokenStatusResponse>>> {
    let status = state.gateway.token_status(&token)?;
    Ok(Json(ApiResponse::ok("Token status", status.into())))
}
