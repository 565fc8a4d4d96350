//! Authentication domain models.
//!
//! These are internal domain models, distinct from the HTTP DTOs in
//! `quill_api::models` (which carry `#[serde(rename_all = "camelCase")]`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable numeric account identity. Always positive for persisted accounts.
pub type AccountId = i64;

/// Account as loaded from the user store.
///
/// The authentication core only ever reads these; creation goes through
/// [`NewAccount`].
#[derive(Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl AccountRecord {
    /// An account may authenticate only when it is active and its email is verified.
    pub fn is_enabled(&self) -> bool {
        self.is_active && self.email_verified
    }

    /// Non-sensitive projection returned to clients.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

impl std::fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("email_verified", &self.email_verified)
            .finish()
    }
}

/// Account to be inserted by the registration flow. The password is
/// already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Identity summary handed back to clients. Never contains the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Login input. Consumed once, never persisted.
#[derive(Clone)]
pub struct Credential {
    pub email_or_username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email_or_username", &self.email_or_username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration input with the plaintext password.
#[derive(Clone)]
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: account id, carried as a decimal string (standard JWT `sub`).
    #[serde(with = "subject")]
    pub sub: AccountId,
    /// Issued at (unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (unix timestamp, seconds).
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

/// Result of a successful login or refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: AccountSummary,
}

/// Expiry information for a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub subject: AccountId,
    pub expires_at: DateTime<Utc>,
    pub nearing_expiry: bool,
}

mod subject {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::AccountId;

    pub fn serialize<S: Serializer>(id: &AccountId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AccountId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}
