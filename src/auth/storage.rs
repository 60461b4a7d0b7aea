//! User account storage.

use crate::error::Result;
use crate::tenancy::Role;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A stored user account.
///
/// Emails are normalized to lowercase before they reach a store, so
/// lookups are exact string matches. The password hash is the PHC string
/// produced by [`crate::auth::PasswordHasher`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Set when the account belongs to an accountant tenant
    pub accountant_tenant_id: Option<String>,
    /// Set when the account belongs to a client tenant
    pub client_tenant_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Read access to user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by its ID.
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>>;

    /// Look up an account by its (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// In-memory user store backed by a `HashMap`.
///
/// Suitable for tests and single-process development setups.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account, replacing any existing one with the same ID.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Number of stored accounts.
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}
