//! Login, registration, refresh and per-request authentication flows.
//!
//! The gateway's collaborators (an account store, a password scheme and a
//! token codec) are all handed in at construction. The only state it keeps
//! itself is a lazily built placeholder hash.

use std::sync::Arc;

use chrono::DateTime;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::AuthError;
use super::codec::TokenCodec;
use super::password::PasswordScheme;
use super::principal::{AuthenticatedIdentity, PrincipalResolver};
use crate::accounts::AccountStore;
use crate::models::auth::{
    AccountId, AccountSummary, AuthSession, Credential, NewAccount, Registration, TokenStatus,
};

/// `token_type` reported alongside every issued token.
pub const TOKEN_TYPE: &str = "Bearer";

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_DISPLAY_NAME_LEN: usize = 100;

// Verified against when the login names no account, so unknown and known
// accounts cost the same hash check.
const DUMMY_PASSWORD: &str = "quill-no-such-account";

pub struct AuthGateway {
    accounts: Arc<dyn AccountStore>,
    passwords: Arc<dyn PasswordScheme>,
    codec: TokenCodec,
    resolver: PrincipalResolver,
    dummy_hash: OnceCell<String>,
}

impl AuthGateway {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        passwords: Arc<dyn PasswordScheme>,
        codec: TokenCodec,
    ) -> Self {
        let resolver = PrincipalResolver::new(Arc::clone(&accounts));
        Self {
            accounts,
            passwords,
            codec,
            resolver,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with email-or-username + password and issue a token.
    ///
    /// Unknown account, wrong password and disabled account all surface as
    /// [`AuthError::InvalidCredentials`]; the actual reason is only logged.
    pub async fn login(&self, credential: Credential) -> Result<AuthSession, AuthError> {
        let login = credential.email_or_username.trim();

        let Some(record) = self.accounts.find_by_email_or_username(login).await? else {
            self.verify_against_dummy(credential.password).await;
            warn!(login, "login rejected: no such account");
            return Err(AuthError::InvalidCredentials);
        };

        let account_id = record.id;
        match self
            .verify_password(credential.password, record.password_hash.clone())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(account_id, "login rejected: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(account_id, error = %e, "login rejected: password verification failed");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let identity = self.resolver.identity_from_account(record).map_err(|e| {
            warn!(account_id, error = %e, "login rejected");
            AuthError::InvalidCredentials
        })?;

        let session = self.issue_session(&identity)?;
        info!(account_id, "login succeeded");
        Ok(session)
    }

    /// Create a new account. It starts active but unverified, so it cannot
    /// log in until its email is verified.
    pub async fn register(&self, registration: Registration) -> Result<AccountSummary, AuthError> {
        let email = registration.email.trim().to_string();
        let username = registration.username.trim().to_string();
        let display_name = registration
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        validate_registration(
            &email,
            &username,
            &registration.password,
            display_name.as_deref(),
        )?;

        if self.accounts.email_exists(&email).await? {
            return Err(AuthError::ValidationError(
                "Email is already registered".into(),
            ));
        }
        if self.accounts.username_exists(&username).await? {
            return Err(AuthError::ValidationError("Username is already taken".into()));
        }

        let password_hash = self.hash_password(registration.password).await?;
        let display_name = display_name.or_else(|| Some(username.clone()));

        let record = self
            .accounts
            .create(NewAccount {
                email,
                username,
                password_hash,
                display_name,
            })
            .await?;

        info!(account_id = record.id, "account registered");
        Ok(record.summary())
    }

    pub async fn is_email_available(&self, email: &str) -> Result<bool, AuthError> {
        Ok(!self.accounts.email_exists(email.trim()).await?)
    }

    pub async fn is_username_available(&self, username: &str) -> Result<bool, AuthError> {
        Ok(!self.accounts.username_exists(username.trim()).await?)
    }

    /// Exchange a still-valid token for a fresh one.
    ///
    /// An expired token cannot refresh itself; the caller has to log in again.
    pub async fn refresh(&self, token: &str) -> Result<AuthSession, AuthError> {
        let claims = self.codec.decode(token)?;
        let identity = self.resolver.identity_from_claims(&claims).await?;
        let session = self.issue_session(&identity)?;
        debug!(account_id = identity.id(), old_jti = %claims.jti, "token refreshed");
        Ok(session)
    }

    /// Mark an account's email as verified, allowing it to log in.
    pub async fn verify_email(&self, id: AccountId) -> Result<(), AuthError> {
        if !self.accounts.set_email_verified(id).await? {
            return Err(AuthError::AccountNotFound(id));
        }
        info!(account_id = id, "email verified");
        Ok(())
    }

    /// Deactivate the caller's account. Tokens already issued for it stop
    /// resolving on their next use.
    pub async fn deactivate(&self, identity: &AuthenticatedIdentity) -> Result<(), AuthError> {
        if !self.accounts.deactivate(identity.id()).await? {
            return Err(AuthError::AccountNotFound(identity.id()));
        }
        info!(account_id = identity.id(), "account deactivated");
        Ok(())
    }

    /// Replace the caller's password after re-checking the current one.
    pub async fn change_password(
        &self,
        identity: &AuthenticatedIdentity,
        current_password: String,
        new_password: String,
    ) -> Result<(), AuthError> {
        validate_password(&new_password)?;

        let matches = self
            .verify_password(current_password, identity.password_hash().to_string())
            .await?;
        if !matches {
            warn!(account_id = identity.id(), "password change rejected: wrong current password");
            return Err(AuthError::ValidationError(
                "Current password is incorrect".into(),
            ));
        }

        let password_hash = self.hash_password(new_password).await?;
        if !self
            .accounts
            .update_password_hash(identity.id(), &password_hash)
            .await?
        {
            return Err(AuthError::AccountNotFound(identity.id()));
        }
        info!(account_id = identity.id(), "password changed");
        Ok(())
    }

    /// Tokens are stateless; logging out is the client discarding its token.
    pub fn logout(&self) {
        debug!("logout requested; nothing to revoke server-side");
    }

    /// Resolve the identity behind a bearer token for one request.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let claims = self.codec.decode(token)?;
        self.resolver.identity_from_claims(&claims).await
    }

    /// Expiry details of a valid token, for proactive refresh.
    pub fn token_status(&self, token: &str) -> Result<TokenStatus, AuthError> {
        let claims = self.codec.decode(token)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Malformed(format!("expiry {} out of range", claims.exp)))?;
        Ok(TokenStatus {
            subject: claims.sub,
            expires_at,
            nearing_expiry: self
                .codec
                .expiry()
                .is_nearing_expiry(&claims, self.codec.now()),
        })
    }

    fn issue_session(&self, identity: &AuthenticatedIdentity) -> Result<AuthSession, AuthError> {
        let access_token = self.codec.issue(self.resolver.to_claims(identity))?;
        Ok(AuthSession {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in: self.codec.expiry().ttl().num_seconds(),
            user: identity.summary(),
        })
    }

    // bcrypt is deliberately slow; keep it off the async workers.
    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task: {e}")))?
    }

    async fn verify_against_dummy(&self, password: String) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await;
        match dummy {
            Ok(hash) => {
                let _ = self.verify_password(password, hash.clone()).await;
            }
            Err(e) => error!(error = %e, "could not prepare placeholder hash"),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let passwords = Arc::clone(&self.passwords);
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task: {e}")))?
    }
}

fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<(), AuthError> {
    let username_len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username_len) {
        return Err(AuthError::ValidationError(format!(
            "Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::ValidationError(
            "Username must not contain whitespace".into(),
        ));
    }
    if email.chars().count() > MAX_EMAIL_LEN || !looks_like_email(email) {
        return Err(AuthError::ValidationError("Email format is invalid".into()));
    }
    if display_name.is_some_and(|name| name.chars().count() > MAX_DISPLAY_NAME_LEN) {
        return Err(AuthError::ValidationError(format!(
            "Display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    validate_password(password)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
