//! Mapping between verified identities and token claims.
//!
//! Only the account id goes into a token. Everything else is reloaded from
//! the account store on every resolve, so deactivating an account takes
//! effect on the next request even though its tokens stay
//! cryptographically valid until they expire.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;
use crate::accounts::AccountStore;
use crate::models::auth::{AccountId, AccountRecord, AccountSummary, TokenClaims};

/// Authority granted to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Regular journal owner.
    User,
}

impl Capability {
    /// Authority string as presented to authorization checks.
    pub fn authority(&self) -> &'static str {
        match self {
            Capability::User => "ROLE_USER",
        }
    }
}

/// Verified identity for the duration of one request.
#[derive(Clone)]
pub struct AuthenticatedIdentity {
    id: AccountId,
    email: String,
    username: String,
    password_hash: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    capabilities: BTreeSet<Capability>,
    enabled: bool,
}

impl AuthenticatedIdentity {
    /// Project an account record. Every account currently holds exactly the
    /// `User` capability.
    pub fn from_record(record: AccountRecord) -> Self {
        let enabled = record.is_enabled();
        Self {
            id: record.id,
            email: record.email,
            username: record.username,
            password_hash: record.password_hash,
            display_name: record.display_name,
            avatar_url: record.avatar_url,
            capabilities: BTreeSet::from([Capability::User]),
            enabled,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Stored hash, for re-verification inside the core only.
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

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

impl PartialEq for AuthenticatedIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AuthenticatedIdentity {}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("capabilities", &self.capabilities)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Clone)]
pub struct PrincipalResolver {
    accounts: Arc<dyn AccountStore>,
}

impl PrincipalResolver {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// The only claim derived from an identity is its subject id; the codec
    /// adds the timestamps and token id.
    pub fn to_claims(&self, identity: &AuthenticatedIdentity) -> AccountId {
        identity.id
    }

    /// Reload the account named by verified claims.
    pub async fn identity_from_claims(
        &self,
        claims: &TokenClaims,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let record = self
            .accounts
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound(claims.sub))?;
        self.identity_from_account(record)
    }

    /// Build an identity from a freshly loaded record, rejecting disabled accounts.
    pub fn identity_from_account(
        &self,
        record: AccountRecord,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let identity = AuthenticatedIdentity::from_record(record);
        if !identity.is_enabled() {
            debug!(account_id = identity.id, "account is disabled");
            return Err(AuthError::AccountDisabled(identity.id));
        }
        Ok(identity)
    }
}
