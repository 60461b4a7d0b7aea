//! Provisioning persistence boundary.
//!
//! The store is where exactly-once actually lives: the processed-event
//! marker and the three account rows commit as one unit, so a retry, a
//! crash between steps, or a concurrent duplicate delivery can never
//! leave a partial account behind.

use crate::auth::{InMemoryUserStore, User, UserStore};
use crate::billing::{InMemorySubscriptionStore, Subscription};
use crate::error::Result;
use crate::tenancy::{InMemoryTenantStore, Tenant, TenantStore};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The full account graph created by one successful provisioning run.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub tenant: Tenant,
    pub subscription: Subscription,
}

/// Result of one provisioning transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// All rows were written and the event marked processed.
    Created,
    /// A concurrent delivery of the same event won the race; nothing was
    /// written by this call.
    AlreadyProcessed,
    /// The email was claimed between validation and commit.
    DuplicateEmail,
    /// The fiscal ID was claimed between validation and commit.
    DuplicateFiscalId,
}

/// Durable storage operations for exactly-once provisioning.
#[async_trait]
pub trait ProvisioningStore: Send + Sync {
    /// Whether this event ID has already been processed.
    async fn is_event_processed(&self, event_id: &str) -> Result<bool>;

    /// Durably mark an event processed without creating any rows.
    ///
    /// Used for events handled outside the provisioning transaction and
    /// for conflict terminals where redelivery cannot succeed.
    /// Idempotent.
    async fn mark_event_processed(&self, event_id: &str) -> Result<()>;

    /// Create the User, Tenant and Subscription rows plus the
    /// processed-event marker as a single atomic unit.
    ///
    /// Uniqueness races lost inside the transaction surface as the
    /// matching non-`Created` outcome, with nothing written.
    async fn provision_account(
        &self,
        event_id: &str,
        account: NewAccount,
    ) -> Result<ProvisionOutcome>;
}

/// In-memory provisioning store over the shared in-memory collections.
///
/// Wraps the same store instances the rest of the application reads, so
/// a provisioned account is immediately visible to login and the
/// authorization guard. A single mutex over the processed-event set
/// serializes provisioning runs, standing in for the database
/// transaction and its unique constraints.
#[derive(Debug)]
pub struct InMemoryProvisioningStore {
    users: Arc<InMemoryUserStore>,
    tenants: Arc<InMemoryTenantStore>,
    subscriptions: Arc<InMemorySubscriptionStore>,
    processed: Mutex<HashSet<String>>,
}

impl InMemoryProvisioningStore {
    #[must_use]
    pub fn new(
        users: Arc<InMemoryUserStore>,
        tenants: Arc<InMemoryTenantStore>,
        subscriptions: Arc<InMemorySubscriptionStore>,
    ) -> Self {
        Self {
            users,
            tenants,
            subscriptions,
            processed: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl ProvisioningStore for InMemoryProvisioningStore {
    async fn is_event_processed(&self, event_id: &str) -> Result<bool> {
        Ok(self.processed.lock().await.contains(event_id))
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<()> {
        self.processed.lock().await.insert(event_id.to_string());
        Ok(())
    }

    async fn provision_account(
        &self,
        event_id: &str,
        account: NewAccount,
    ) -> Result<ProvisionOutcome> {
        // Held across the whole check-then-insert sequence; concurrent
        // provisioning runs are fully serialized, like transactions
        // contending on the same unique index.
        let mut processed = self.processed.lock().await;

        if processed.contains(event_id) {
            return Ok(ProvisionOutcome::AlreadyProcessed);
        }
        if self.users.find_by_email(&account.user.email).await?.is_some() {
            return Ok(ProvisionOutcome::DuplicateEmail);
        }
        if self.tenants.fiscal_id_exists(account.tenant.fiscal_id()).await? {
            return Ok(ProvisionOutcome::DuplicateFiscalId);
        }

        self.users.insert(account.user).await;
        self.tenants.insert(account.tenant).await;
        self.subscriptions.insert(account.subscription).await;
        processed.insert(event_id.to_string());

        Ok(ProvisionOutcome::Created)
    }
}
