//! Token signing settings.

use std::str::FromStr;

use chrono::Duration;
use jsonwebtoken::Algorithm;

use super::AuthError;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Default refresh window: the last hour before expiry.
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 60 * 60;

/// Everything needed to sign and verify access tokens.
///
/// Loaded once at startup and never rotated at runtime.
#[derive(Clone)]
pub struct TokenSettings {
    /// Pre-shared HMAC secret.
    pub secret: String,
    /// Lifetime from issuance to expiry.
    pub ttl: Duration,
    /// Window before expiry during which a refresh is recommended.
    pub refresh_threshold: Duration,
    /// HMAC algorithm used to sign tokens.
    pub algorithm: Algorithm,
}

impl TokenSettings {
    /// Settings with the default lifetime, refresh window and `HS256`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            refresh_threshold: Duration::seconds(DEFAULT_REFRESH_THRESHOLD_SECS),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Parse an HMAC algorithm name (`HS256`, `HS384`, `HS512`).
pub fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, AuthError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|e| AuthError::Config(format!("unknown JWT algorithm '{name}': {e}")))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(AuthError::Config(format!(
            "JWT algorithm {other:?} is not a shared-secret algorithm"
        ))),
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET`.
///
/// A missing secret is a startup error; tokens are never signed with a
/// generated or default key.
pub fn resolve_jwt_secret() -> Result<String, AuthError> {
    resolve_jwt_secret_with(|var| std::env::var(var).ok())
}

/// [`resolve_jwt_secret`] against an arbitrary variable source.
pub fn resolve_jwt_secret_with(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, AuthError> {
    ["JWT_SECRET", "AUTH_SECRET"]
        .into_iter()
        .filter_map(&lookup)
        .find(|secret| !secret.trim().is_empty())
        .ok_or_else(|| {
            AuthError::Encoding("JWT_SECRET (or AUTH_SECRET) must be set to a non-empty value".into())
        })
}
