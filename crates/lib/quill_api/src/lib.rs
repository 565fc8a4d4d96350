//! # quill_api
//!
//! HTTP API library for Quill authentication.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use quill_core::accounts::AccountStore;
use quill_core::auth::AuthError;
use quill_core::auth::clock::SystemClock;
use quill_core::auth::codec::TokenCodec;
use quill_core::auth::gateway::AuthGateway;
use quill_core::auth::password::Bcrypt;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Login, refresh and token verification.
    pub gateway: Arc<AuthGateway>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Production wiring: wall clock and default-cost bcrypt.
    pub fn new(config: ApiConfig, accounts: Arc<dyn AccountStore>) -> Result<Self, AuthError> {
        let codec = TokenCodec::new(&config.token, Arc::new(SystemClock))?;
        let gateway = AuthGateway::new(accounts, Arc::new(Bcrypt::default()), codec);
        Ok(Self {
            gateway: Arc::new(gateway),
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `quill_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    quill_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::GET_AUTH_CHECK_EMAIL, get(auth::check_email_handler))
        .route(
            routes::GET_AUTH_CHECK_USERNAME,
            get(auth::check_username_handler),
        )
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            routes::GET_AUTH_TOKEN_STATUS,
            get(auth::token_status_handler),
        )
        .route(
            routes::USERS_ME,
            get(users::me_handler).delete(users::deactivate_handler),
        )
        .route(
            routes::PUT_USERS_ME_PASSWORD,
            put(users::change_password_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
