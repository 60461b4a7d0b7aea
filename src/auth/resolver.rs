//! Credential to caller resolution.

use crate::auth::error::AuthError;
use crate::auth::password::PasswordHasher;
use crate::auth::storage::UserStore;
use crate::auth::token::{IssuedToken, TokenIssuer, TokenVerifier};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::tenancy::{Caller, TenantContext};
use std::sync::Arc;
use std::time::Duration;

/// Resolves credentials into caller identities.
///
/// Resolution always goes back to the stored account, so deactivation
/// takes effect immediately regardless of what a still-valid token
/// claims. On success the caller's own tenant is bound into the ambient
/// [`TenantContext`] for the rest of the request.
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    passwords: PasswordHasher,
}

impl IdentityResolver {
    /// Create a resolver over the given user store.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            users,
            issuer: TokenIssuer::from_secret(
                &config.jwt_secret,
                Duration::from_secs(config.token_ttl_seconds),
            ),
            verifier: TokenVerifier::from_secret(&config.jwt_secret),
            passwords: PasswordHasher::default(),
        }
    }

    /// Replace the password hasher, e.g. with faster parameters in tests.
    #[must_use]
    pub fn with_password_hasher(mut self, passwords: PasswordHasher) -> Self {
        self.passwords = passwords;
        self
    }

    /// Exchange an email and password for an access token.
    ///
    /// A missing account and a wrong password produce the same error, so
    /// responses never confirm whether an email is registered.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredential.into());
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredential.into());
        }

        if !user.active {
            return Err(AuthError::InactiveAccount.into());
        }

        tracing::debug!(user_id = %user.id, "Login succeeded");
        self.issuer.issue(&user)
    }

    /// Resolve a bearer token into a [`Caller`].
    ///
    /// Verifies the token, reloads the account, rejects deactivated
    /// accounts, then binds the caller's own tenant into the ambient
    /// context. Must run inside a [`TenantContext::run`] scope.
    pub async fn resolve(&self, token: &str) -> Result<Caller> {
        let claims = self.verifier.verify(token)?;

        let Some(user) = self.users.find_by_id(&claims.sub).await? else {
            return Err(AuthError::InvalidCredential.into());
        };

        if !user.active {
            return Err(AuthError::InactiveAccount.into());
        }

        // The stored account wins over whatever the token was issued with.
        let caller = Caller {
            user_id: user.id,
            role: user.role,
            accountant_tenant_id: user.accountant_tenant_id,
            client_tenant_id: user.client_tenant_id,
        };

        if let Some(tenant_id) = caller.tenant_id() {
            TenantContext::bind(tenant_id)?;
        }

        Ok(caller)
    }
}
