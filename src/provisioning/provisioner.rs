//! Exactly-once account creation from payment-provider webhooks.
//!
//! A completed checkout arrives as an at-least-once webhook delivery.
//! The provisioner turns that stream into exactly-once account creation:
//! verify the signature over the raw body, deduplicate on the event ID,
//! re-validate uniqueness, then commit User + Tenant + Subscription and
//! the processed-event marker as one atomic unit. An unexpected failure
//! leaves the event unmarked so the provider's retry starts over from a
//! clean slate.

use crate::auth::{User, UserStore};
use crate::billing::{CheckoutIntent, Subscription, SubscriptionStatus, SubscriptionStore};
use crate::error::Result;
use crate::provisioning::error::ProvisioningError;
use crate::provisioning::storage::{NewAccount, ProvisionOutcome, ProvisioningStore};
use crate::provisioning::webhook::{WebhookEvent, WebhookVerifier};
use crate::tenancy::{
    AccountantTenant, ClientModules, ClientTenant, Role, Tenant, TenantKind, TenantStore,
};
use crate::traits::Mailer;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// What one webhook delivery amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A new account graph was created.
    Provisioned,
    /// An existing subscription's status was synchronized.
    SubscriptionSynced,
    /// This event ID was handled before; nothing was written.
    AlreadyProcessed,
    /// The event is not relevant, or references nothing we track.
    Ignored,
}

impl WebhookOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::SubscriptionSynced => "subscription_synced",
            Self::AlreadyProcessed => "already_processed",
            Self::Ignored => "ignored",
        }
    }
}

/// Consumes provider webhooks and materializes accounts.
pub struct Provisioner {
    store: Arc<dyn ProvisioningStore>,
    users: Arc<dyn UserStore>,
    tenants: Arc<dyn TenantStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    verifier: WebhookVerifier,
    mailer: Option<Arc<dyn Mailer>>,
    mail_from: String,
}

impl Provisioner {
    #[must_use]
    pub fn new(
        store: Arc<dyn ProvisioningStore>,
        users: Arc<dyn UserStore>,
        tenants: Arc<dyn TenantStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            store,
            users,
            tenants,
            subscriptions,
            verifier,
            mailer: None,
            mail_from: String::new(),
        }
    }

    /// Send a welcome email after each successful provisioning, from the
    /// given sender address. Without this the step is skipped entirely.
    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        self.mailer = Some(mailer);
        self.mail_from = from.into();
        self
    }

    /// Handle one raw webhook delivery.
    ///
    /// `signature_header` is the value of the `Billing-Signature` header;
    /// verification happens before anything touches storage. Success
    /// outcomes are safe to acknowledge to the provider; errors map to
    /// the response codes in [`ProvisioningError`].
    pub async fn handle_delivery(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome> {
        self.verifier.verify(payload, signature_header)?;
        let event = WebhookEvent::from_payload(payload)?;

        if self.store.is_event_processed(&event.id).await? {
            tracing::debug!(event_id = %event.id, "Webhook event already processed");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        match event.event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&event).await,
            "customer.subscription.updated" | "customer.subscription.deleted" => {
                self.handle_subscription_event(&event).await
            }
            _ => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Ignoring webhook event"
                );
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn handle_checkout_completed(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let intent =
            CheckoutIntent::from_metadata(&event.metadata()).map_err(ProvisioningError::from)?;
        let Some(provider_subscription_id) = event.object_str("subscription") else {
            return Err(ProvisioningError::InvalidWebhookPayload {
                message: "missing subscription reference".to_string(),
            }
            .into());
        };

        // A concurrent signup may have claimed the email or fiscal ID
        // since the checkout session was opened.
        if self.users.find_by_email(&intent.email).await?.is_some() {
            return self.conflict(event, "email").await;
        }
        if self.tenants.fiscal_id_exists(&intent.fiscal_id).await? {
            return self.conflict(event, "fiscal ID").await;
        }

        let account = build_account(&intent, provider_subscription_id);
        match self.store.provision_account(&event.id, account.clone()).await? {
            ProvisionOutcome::Created => {
                tracing::info!(
                    event_id = %event.id,
                    user_id = %account.user.id,
                    tenant_id = %account.tenant.id(),
                    kind = %intent.kind,
                    plan_id = %intent.plan_id,
                    "Account provisioned"
                );
                self.send_welcome(&account);
                Ok(WebhookOutcome::Provisioned)
            }
            ProvisionOutcome::AlreadyProcessed => Ok(WebhookOutcome::AlreadyProcessed),
            ProvisionOutcome::DuplicateEmail => self.conflict(event, "email").await,
            ProvisionOutcome::DuplicateFiscalId => self.conflict(event, "fiscal ID").await,
        }
    }

    /// Terminal conflict: mark the event so redeliveries short-circuit,
    /// then surface the failure. The payment behind it needs manual
    /// reconciliation.
    async fn conflict(&self, event: &WebhookEvent, field: &'static str) -> Result<WebhookOutcome> {
        tracing::error!(event_id = %event.id, field, "Provisioning conflict");
        self.store.mark_event_processed(&event.id).await?;
        Err(ProvisioningError::DuplicateDuringProvisioning { field }.into())
    }

    async fn handle_subscription_event(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let Some(provider_ref) = event.object_str("id") else {
            return Err(ProvisioningError::InvalidWebhookPayload {
                message: "missing subscription id".to_string(),
            }
            .into());
        };

        let status = if event.event_type == "customer.subscription.deleted" {
            SubscriptionStatus::Canceled
        } else {
            SubscriptionStatus::from_provider(event.object_str("status").unwrap_or("active"))
        };
        let period_end = event
            .data
            .object
            .get("current_period_end")
            .and_then(|v| v.as_i64())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        if !self
            .subscriptions
            .update_status(provider_ref, status, period_end)
            .await?
        {
            // Nothing to sync: either a subscription we never owned, or
            // an event that outran its own checkout completion.
            tracing::debug!(
                event_id = %event.id,
                provider_ref,
                "No matching subscription; ignoring"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        self.store.mark_event_processed(&event.id).await?;
        tracing::info!(
            event_id = %event.id,
            provider_ref,
            status = %status,
            "Subscription synchronized"
        );
        Ok(WebhookOutcome::SubscriptionSynced)
    }

    fn send_welcome(&self, account: &NewAccount) {
        let Some(mailer) = &self.mailer else {
            return;
        };
        let mailer = Arc::clone(mailer);
        let email =
            crate::email::welcome_email(&self.mail_from, &account.user.email, account.tenant.name());
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&email).await {
                tracing::warn!(error = %e, "Failed to send welcome email");
            }
        });
    }
}

/// Assemble the rows for one account from a parsed intent.
///
/// IDs are minted here; the discriminator in the intent picks the tenant
/// variant and the matching user role.
fn build_account(intent: &CheckoutIntent, provider_subscription_id: &str) -> NewAccount {
    let now = Utc::now();
    let user_id = Uuid::new_v4().to_string();
    let tenant_id = Uuid::new_v4().to_string();

    let (role, tenant, accountant_tenant_id, client_tenant_id) = match intent.kind {
        TenantKind::Accountant => (
            Role::Accountant,
            Tenant::Accountant(AccountantTenant {
                id: tenant_id.clone(),
                owner_user_id: user_id.clone(),
                company_name: intent.company_name.clone().unwrap_or_default(),
                registration_number: intent.registration_number.clone().unwrap_or_default(),
                fiscal_id: intent.fiscal_id.clone(),
                active: true,
                created_at: now,
            }),
            Some(tenant_id.clone()),
            None,
        ),
        TenantKind::Client => (
            Role::Client,
            Tenant::Client(ClientTenant {
                id: tenant_id.clone(),
                owner_user_id: user_id.clone(),
                display_name: intent.display_name.clone().unwrap_or_default(),
                fiscal_id: intent.fiscal_id.clone(),
                // Self-signup clients start unmanaged; a firm link is
                // established later by invitation.
                accountant_tenant_id: None,
                modules: ClientModules::default(),
                active: true,
                created_at: now,
            }),
            None,
            Some(tenant_id.clone()),
        ),
    };

    NewAccount {
        user: User {
            id: user_id,
            email: intent.email.clone(),
            password_hash: intent.password_hash.clone(),
            role,
            accountant_tenant_id,
            client_tenant_id,
            active: true,
            created_at: now,
        },
        tenant,
        subscription: Subscription {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            plan_id: intent.plan_id.clone(),
            interval: intent.interval,
            status: SubscriptionStatus::Active,
            provider_subscription_id: provider_subscription_id.to_string(),
            current_period_end: None,
            created_at: now,
        },
    }
}
