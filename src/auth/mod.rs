pub mod password;

use std::fmt;

use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claims carried by every bearer token. `user_id` is the only identity claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Authentication failures, ordered by how far verification got.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No usable credential on the request (401)
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// Credential present but malformed, tampered or expired (403)
    #[error("{0}")]
    Forbidden(&'static str),

    /// Signing is impossible with the current configuration
    #[error("authentication is not configured: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens with a single process-wide secret.
///
/// Stateless: nothing about issued tokens is remembered, so a token stays
/// valid until its `exp` passes.
#[derive(Clone)]
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("signing secret is empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against the caller's clock in verify_token_at, without leeway
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        let ttl = i64::try_from(security.jwt_expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or_else(|| AuthError::Configuration("token lifetime out of range".to_string()))?;
        Self::new(&security.jwt_secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Configuration("token expiry overflows the clock".to_string()))?;
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Configuration(format!("token signing failed: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_token_at(token, Utc::now())
    }

    /// Check signature and expiry of a compact token as of `now`.
    ///
    /// A token is accepted iff its HMAC matches and `now < exp`. The signature
    /// comparison is done by the HMAC verifier, which compares in constant time.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::Forbidden("Invalid token signature"),
                ErrorKind::InvalidAlgorithm => AuthError::Forbidden("Unsupported token algorithm"),
                _ => AuthError::Forbidden("Malformed token"),
            }
        })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!(user_id = data.claims.user_id, "rejected expired token");
            return Err(AuthError::Forbidden("Token has expired"));
        }

        Ok(data.claims)
    }

    /// Authenticate a request from its headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = bearer_token(headers.get(AUTHORIZATION))?;
        self.verify_token(token)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = value.ok_or(AuthError::Unauthenticated("Missing Authorization header"))?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("Invalid Authorization header format"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::Unauthenticated("Authorization header must use Bearer token format"))?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::Unauthenticated("Authorization header must use Bearer token format"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthenticated("Empty bearer token"));
    }

    Ok(token)
}
