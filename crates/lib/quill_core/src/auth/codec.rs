//! JWT access token signing and verification.
//!
//! Tokens are compact JWTs signed with a shared HMAC secret. Verification
//! order is fixed: shape and signature first (inside `jsonwebtoken`), then
//! claim sanity, then expiry against the injected [`Clock`]. A token that
//! fails integrity is never reported as expired.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::AuthError;
use super::clock::Clock;
use super::expiry::ExpiryPolicy;
use super::settings::TokenSettings;
use crate::models::auth::{AccountId, TokenClaims};

pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: ExpiryPolicy,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Build a codec from startup settings.
    ///
    /// Fails with [`AuthError::Encoding`] when the secret is empty and with
    /// [`AuthError::Config`] when the lifetime settings are inconsistent.
    pub fn new(settings: &TokenSettings, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        if settings.secret.trim().is_empty() {
            return Err(AuthError::Encoding("signing secret is empty".into()));
        }
        if !matches!(
            settings.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Config(format!(
                "JWT algorithm {:?} is not a shared-secret algorithm",
                settings.algorithm
            )));
        }
        let expiry = ExpiryPolicy::new(settings.ttl, settings.refresh_threshold)?;

        // Expiry is checked here against the injected clock, not by
        // jsonwebtoken against the wall clock.
        let mut validation = Validation::new(settings.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let secret = settings.secret.as_bytes();
        Ok(Self {
            algorithm: settings.algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry,
            clock,
        })
    }

    pub fn expiry(&self) -> &ExpiryPolicy {
        &self.expiry
    }

    /// Current instant according to the codec's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a token for `subject`, issued now.
    pub fn issue(&self, subject: AccountId) -> Result<String, AuthError> {
        self.issue_at(subject, self.clock.now())
    }

    /// Issue a token for `subject` with an explicit issue instant.
    pub fn issue_at(
        &self,
        subject: AccountId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.expiry.ttl())
            .ok_or_else(|| {
                AuthError::Encoding(format!(
                    "expiry of a token issued at {issued_at} is out of range"
                ))
            })?;
        let claims = TokenClaims {
            sub: subject,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        self.encode(&claims)
    }

    /// Sign an explicit claim set.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        if claims.sub <= 0 {
            return Err(AuthError::Encoding(format!(
                "subject must be a positive account id, got {}",
                claims.sub
            )));
        }
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(format!("jwt encode: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if self.expiry.is_expired(&claims, self.clock.now()) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Verify signature and claim shape without looking at the clock.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed(e.to_string()),
            })?;

        if claims.sub <= 0 {
            return Err(AuthError::Malformed(format!(
                "subject {} is not a positive account id",
                claims.sub
            )));
        }
        if claims.exp < claims.iat {
            return Err(AuthError::Malformed(format!(
                "expiry {} precedes issue time {}",
                claims.exp, claims.iat
            )));
        }
        Ok(claims)
    }
}
