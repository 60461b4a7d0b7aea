//! Access token issuance and verification.
//!
//! Tokens are HS256 JWTs. The verifier pins the algorithm so a token
//! signed with anything else, including `none`, is rejected outright.

use crate::auth::claims::Claims;
use crate::auth::error::AuthError;
use crate::auth::storage::User;
use crate::error::{Result, TallywardError};
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// An issued access token with its lifetime.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
    /// The encoded JWT
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Issues access tokens for authenticated accounts.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from a shared HS256 secret.
    #[must_use]
    pub fn from_secret(secret: &SecretString, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            ttl,
        }
    }

    /// Issue a token describing the given account.
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = current_timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            accountant_tenant_id: user.accountant_tenant_id.clone(),
            client_tenant_id: user.client_tenant_id.clone(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TallywardError::Internal(format!("Failed to encode access token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl.as_secs(),
        })
    }
}

/// Verifies access tokens and yields their claims.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from a shared HS256 secret.
    #[must_use]
    pub fn from_secret(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Decode and validate a token.
    ///
    /// Any failure, wrong signature, wrong algorithm, or expiry, maps to
    /// the same [`AuthError::InvalidCredential`].
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidCredential)
    }
}

/// Extracts bearer tokens from request headers.
pub struct BearerToken;

impl BearerToken {
    /// Extract the token from the Authorization header.
    pub fn from_parts(parts: &Parts) -> Result<String> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| TallywardError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                TallywardError::unauthorized(
                    "Invalid authorization header format. Expected: Bearer <token>",
                )
            })?
            .to_string();

        if token.is_empty() {
            return Err(TallywardError::unauthorized("Empty bearer token"));
        }

        Ok(token)
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
