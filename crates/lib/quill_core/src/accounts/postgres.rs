//! PostgreSQL-backed account store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::{AccountId, AccountRecord, NewAccount};

/// Column order shared by every `SELECT` below.
const ACCOUNT_COLUMNS: &str = "id, email, username, password_hash, display_name, avatar_url, \
                               is_active, email_verified";

type AccountRow = (
    i64,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
    bool,
);

fn into_record(row: AccountRow) -> AccountRecord {
    let (id, email, username, password_hash, display_name, avatar_url, is_active, email_verified) =
        row;
    AccountRecord {
        id,
        email,
        username,
        password_hash,
        display_name,
        avatar_url,
        is_active,
        email_verified,
    }
}

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(into_record))
    }

    async fn find_by_email_or_username(
        &self,
        login: &str,
    ) -> Result<Option<AccountRecord>, AuthError> {
        // Prefer the email match if one account's email equals another's username.
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users \
             WHERE email = $1 OR username = $1 \
             ORDER BY (email = $1) DESC LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(into_record))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, account: NewAccount) -> Result<AccountRecord, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO users (email, username, password_hash, display_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let taken = if db.constraint().is_some_and(|c| c.contains("username")) {
                    "Username is already taken"
                } else {
                    "Email is already registered"
                };
                AuthError::ValidationError(taken.into())
            }
            other => AuthError::DbError(other),
        })?;
        Ok(into_record(row))
    }

    async fn set_email_verified(&self, id: AccountId) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: AccountId) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
