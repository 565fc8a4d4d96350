//! Token lifetime and proactive-refresh decisions.
//!
//! All comparisons happen at whole-second resolution, the resolution of
//! the `iat`/`exp` claims. Expiry is exclusive: a token is no longer
//! valid at the instant `now == exp`.

use chrono::{DateTime, Duration, Utc};

use super::AuthError;
use crate::models::auth::TokenClaims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
    refresh_threshold: Duration,
}

impl ExpiryPolicy {
    /// `ttl` must be at least one second and `refresh_threshold` must lie
    /// in `[0, ttl)`, so a freshly issued token is never already due for
    /// refresh.
    pub fn new(ttl: Duration, refresh_threshold: Duration) -> Result<Self, AuthError> {
        if ttl.num_seconds() <= 0 {
            return Err(AuthError::Config(format!(
                "token lifetime must be at least one second, got {ttl}"
            )));
        }
        if refresh_threshold < Duration::zero() {
            return Err(AuthError::Config(format!(
                "refresh threshold must not be negative, got {refresh_threshold}"
            )));
        }
        if refresh_threshold.num_seconds() >= ttl.num_seconds() {
            return Err(AuthError::Config(format!(
                "refresh threshold ({refresh_threshold}) must be shorter than the token lifetime ({ttl})"
            )));
        }
        Ok(Self {
            ttl,
            refresh_threshold,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn refresh_threshold(&self) -> Duration {
        self.refresh_threshold
    }

    /// Expiry timestamp for a token issued at `issued_at` (unix seconds).
    pub fn expires_at(&self, issued_at: i64) -> i64 {
        issued_at.saturating_add(self.ttl.num_seconds())
    }

    pub fn is_expired(&self, claims: &TokenClaims, now: DateTime<Utc>) -> bool {
        now.timestamp() >= claims.exp
    }

    /// True once the token is within the refresh window. Stays true from
    /// then on, including after expiry.
    pub fn is_nearing_expiry(&self, claims: &TokenClaims, now: DateTime<Utc>) -> bool {
        claims.exp - now.timestamp() <= self.refresh_threshold.num_seconds()
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, claims: &TokenClaims, now: DateTime<Utc>) -> Duration {
        Duration::seconds((claims.exp - now.timestamp()).max(0))
    }
}
