//! Credential verification and issuance (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use inkpost_core::UserId;

use crate::{AuthError, JwtClaims, TokenValidationError, validate_claims};

/// Verifies an opaque access token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;

    /// Verify `token` and extract its subject.
    ///
    /// Every rejection reason collapses into [`AuthError::Unauthenticated`].
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        match self.validate(token, now) {
            Ok(claims) => Ok(claims.sub),
            Err(e) => {
                tracing::debug!(reason = %e, "token rejected");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

/// HMAC-SHA256 token validator.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|_| TokenValidationError::Invalid)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct TokenIssueError(#[from] jsonwebtoken::errors::Error);

/// Mints access tokens at login.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<String, TokenIssueError>;

    /// Lifetime of issued tokens.
    fn ttl(&self) -> Duration;
}

pub struct Hs256JwtIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256JwtIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            ttl,
        }
    }
}

impl JwtIssuer for Hs256JwtIssuer {
    fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<String, TokenIssueError> {
        let claims = JwtClaims::new(sub, now, self.ttl);
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.key,
        )?)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
