//! API server configuration.

use chrono::{Duration, Utc};
use quill_core::auth::AuthError;
use quill_core::auth::expiry::ExpiryPolicy;
use quill_core::auth::settings::{
    DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_TOKEN_TTL_SECS, TokenSettings, parse_hmac_algorithm,
    resolve_jwt_secret_with,
};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Token signing and expiry settings.
    pub token: TokenSettings,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                     | Default                           |
    /// |------------------------------|-----------------------------------|
    /// | `BIND_ADDR`                  | `127.0.0.1:8080`                  |
    /// | `DATABASE_URL`               | `postgres://localhost:5432/quill` |
    /// | `JWT_SECRET` / `AUTH_SECRET` | required                          |
    /// | `JWT_EXPIRATION_SECS`        | `86400`                           |
    /// | `JWT_REFRESH_THRESHOLD_SECS` | `3600`                            |
    /// | `JWT_ALGORITHM`              | `HS256`                           |
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ApiConfig::from_env`] with variables read from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let secret = resolve_jwt_secret_with(&lookup)?;
        let ttl = seconds_var(&lookup, "JWT_EXPIRATION_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let threshold = seconds_var(
            &lookup,
            "JWT_REFRESH_THRESHOLD_SECS",
            DEFAULT_REFRESH_THRESHOLD_SECS,
        )?;
        ExpiryPolicy::new(ttl, threshold)?;
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err(AuthError::Config(format!(
                "JWT_EXPIRATION_SECS={} puts token expiry out of range",
                ttl.num_seconds()
            )));
        }

        let mut token = TokenSettings::new(secret)
            .with_ttl(ttl)
            .with_refresh_threshold(threshold);
        if let Some(name) = lookup("JWT_ALGORITHM") {
            token = token.with_algorithm(parse_hmac_algorithm(&name)?);
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into()),
            pg_connection_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/quill".into()),
            token,
        })
    }
}

fn seconds_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: i64,
) -> Result<Duration, AuthError> {
    let secs = match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|e| AuthError::Config(format!("{var}='{raw}' is not a number of seconds: {e}")))?,
        None => default,
    };
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::Config(format!("{var}={secs} is out of range")))
}
