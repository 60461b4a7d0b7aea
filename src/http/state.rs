//! Shared application state.

use crate::auth::{IdentityResolver, InMemoryUserStore, UserStore};
use crate::billing::{
    CheckoutConfig, CheckoutManager, InMemoryPlanStore, InMemorySubscriptionStore, MockGateway,
    PaymentGateway, PlanStore, SubscriptionStore,
};
use crate::config::Config;
use crate::email::ConsoleMailer;
use crate::error::{Result, TallywardError};
use crate::provisioning::{InMemoryProvisioningStore, Provisioner, WebhookVerifier};
use crate::tenancy::{InMemoryTenantStore, TenantGuard, TenantStore};
use crate::traits::{CsvExporter, Mailer, ReportExporter};
use std::sync::Arc;

/// Everything the request handlers share.
///
/// All fields are cheap to clone; axum clones the state per request.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub checkout: Arc<CheckoutManager>,
    pub provisioner: Arc<Provisioner>,
    pub guard: Arc<TenantGuard>,
    pub tenants: Arc<dyn TenantStore>,
    pub plans: Arc<dyn PlanStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub exporter: Arc<dyn ReportExporter>,
}

impl AppState {
    /// Builder for assembling state from individually constructed parts.
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// State wired entirely from in-memory stores, with a mock payment
    /// gateway and a console mailer. The returned handles expose the
    /// concrete stores for seeding and inspection.
    ///
    /// This is the development and test configuration; production
    /// assembly goes through [`AppState::builder`] with persistent
    /// stores and a live gateway.
    #[must_use]
    pub fn in_memory(config: &Config) -> InMemoryApp {
        let users = Arc::new(InMemoryUserStore::new());
        let tenants = Arc::new(InMemoryTenantStore::new());
        let plans = Arc::new(InMemoryPlanStore::new());
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());
        let gateway = Arc::new(MockGateway::new());
        let provisioning = Arc::new(InMemoryProvisioningStore::new(
            Arc::clone(&users),
            Arc::clone(&tenants),
            Arc::clone(&subscriptions),
        ));

        let resolver = Arc::new(IdentityResolver::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            &config.auth,
        ));
        let checkout = Arc::new(CheckoutManager::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&tenants) as Arc<dyn TenantStore>,
            Arc::clone(&plans) as Arc<dyn PlanStore>,
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
            CheckoutConfig::from_billing(&config.billing),
        ));
        let provisioner = Arc::new(
            Provisioner::new(
                Arc::clone(&provisioning) as _,
                Arc::clone(&users) as Arc<dyn UserStore>,
                Arc::clone(&tenants) as Arc<dyn TenantStore>,
                Arc::clone(&subscriptions) as Arc<dyn SubscriptionStore>,
                WebhookVerifier::new(config.billing.webhook_secret.clone()),
            )
            .with_mailer(
                Arc::new(ConsoleMailer::new()) as Arc<dyn Mailer>,
                "no-reply@tallyward.app",
            ),
        );
        let guard = Arc::new(TenantGuard::new(
            Arc::clone(&tenants) as Arc<dyn TenantStore>
        ));

        let state = AppState {
            resolver,
            checkout,
            provisioner,
            guard,
            tenants: Arc::clone(&tenants) as Arc<dyn TenantStore>,
            plans: Arc::clone(&plans) as Arc<dyn PlanStore>,
            subscriptions: Arc::clone(&subscriptions) as Arc<dyn SubscriptionStore>,
            exporter: Arc::new(CsvExporter::new()),
        };

        InMemoryApp {
            state,
            users,
            tenants,
            plans,
            subscriptions,
            gateway,
            provisioning,
        }
    }
}

// The store fields are trait objects without Debug.
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// An [`AppState`] over in-memory stores plus handles to the concrete
/// store instances behind it.
pub struct InMemoryApp {
    pub state: AppState,
    pub users: Arc<InMemoryUserStore>,
    pub tenants: Arc<InMemoryTenantStore>,
    pub plans: Arc<InMemoryPlanStore>,
    pub subscriptions: Arc<InMemorySubscriptionStore>,
    pub gateway: Arc<MockGateway>,
    pub provisioning: Arc<InMemoryProvisioningStore>,
}

/// Fluent assembly for [`AppState`].
///
/// Every part is required; [`AppStateBuilder::build`] reports the first
/// missing one.
#[derive(Default)]
pub struct AppStateBuilder {
    resolver: Option<Arc<IdentityResolver>>,
    checkout: Option<Arc<CheckoutManager>>,
    provisioner: Option<Arc<Provisioner>>,
    guard: Option<Arc<TenantGuard>>,
    tenants: Option<Arc<dyn TenantStore>>,
    plans: Option<Arc<dyn PlanStore>>,
    subscriptions: Option<Arc<dyn SubscriptionStore>>,
    exporter: Option<Arc<dyn ReportExporter>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<IdentityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn checkout(mut self, checkout: Arc<CheckoutManager>) -> Self {
        self.checkout = Some(checkout);
        self
    }

    #[must_use]
    pub fn provisioner(mut self, provisioner: Arc<Provisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    #[must_use]
    pub fn guard(mut self, guard: Arc<TenantGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn tenants(mut self, tenants: Arc<dyn TenantStore>) -> Self {
        self.tenants = Some(tenants);
        self
    }

    #[must_use]
    pub fn plans(mut self, plans: Arc<dyn PlanStore>) -> Self {
        self.plans = Some(plans);
        self
    }

    #[must_use]
    pub fn subscriptions(mut self, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        self.subscriptions = Some(subscriptions);
        self
    }

    #[must_use]
    pub fn exporter(mut self, exporter: Arc<dyn ReportExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn build(self) -> Result<AppState> {
        fn missing(part: &str) -> TallywardError {
            TallywardError::internal(format!("AppState is missing the {part}"))
        }

        Ok(AppState {
            resolver: self.resolver.ok_or_else(|| missing("identity resolver"))?,
            checkout: self.checkout.ok_or_else(|| missing("checkout manager"))?,
            provisioner: self.provisioner.ok_or_else(|| missing("provisioner"))?,
            guard: self.guard.ok_or_else(|| missing("tenant guard"))?,
            tenants: self.tenants.ok_or_else(|| missing("tenant store"))?,
            plans: self.plans.ok_or_else(|| missing("plan store"))?,
            subscriptions: self
                .subscriptions
                .ok_or_else(|| missing("subscription store"))?,
            exporter: self.exporter.ok_or_else(|| missing("report exporter"))?,
        })
    }
}
