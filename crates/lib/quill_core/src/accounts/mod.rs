//! Account lookup consumed by the authentication core.
//!
//! The core never owns account persistence; it reads through
//! [`AccountStore`] and writes only registration, verification,
//! deactivation and password changes.

mod memory;
mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;

use crate::auth::AuthError;
use crate::models::auth::{AccountId, AccountRecord, NewAccount};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, AuthError>;

    /// Match `login` against either the email or the username.
    async fn find_by_email_or_username(
        &self,
        login: &str,
    ) -> Result<Option<AccountRecord>, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Insert a new active, unverified account. Fails with
    /// [`AuthError::ValidationError`] when the email or username is taken.
    async fn create(&self, account: NewAccount) -> Result<AccountRecord, AuthError>;

    /// Mark the email as verified. Returns `false` if the account is unknown.
    async fn set_email_verified(&self, id: AccountId) -> Result<bool, AuthError>;

    /// Clear `is_active`. Returns `false` if the account is unknown.
    async fn deactivate(&self, id: AccountId) -> Result<bool, AuthError>;

    /// Replace the stored hash. Returns `false` if the account is unknown.
    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<bool, AuthError>;
}
