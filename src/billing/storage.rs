//! Plan and subscription storage.
//!
//! Plans are read-only reference data here; subscriptions are created by
//! the provisioner and kept in sync by webhooks. Per-tenant subscription
//! reads take a [`TenantFilter`] so an unscoped query does not compile.

use crate::billing::subscription::{BillingInterval, Subscription, SubscriptionStatus};
use crate::error::Result;
use crate::tenancy::{TenantFilter, TenantKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A subscription plan offered at signup.
///
/// Each plan targets one audience: firm plans are invisible to
/// individual signups and vice versa. Provider price references are per
/// interval; a missing reference for a requested interval is a
/// configuration fault, not a lookup miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    /// Unique plan identifier (e.g. "contador-pro", "autonomo").
    pub id: String,
    /// Display name shown on the pricing page.
    pub name: String,
    /// Which kind of signup may purchase this plan.
    pub audience: TenantKind,
    /// Provider price reference for monthly billing.
    pub monthly_price_id: Option<String>,
    /// Provider price reference for yearly billing.
    pub yearly_price_id: Option<String>,
    /// Monthly price in cents, for display.
    pub monthly_price_cents: Option<i64>,
    /// Yearly price in cents, for display.
    pub yearly_price_cents: Option<i64>,
    /// Currency code (e.g. "brl").
    pub currency: String,
    /// Feature toggles as an object of booleans.
    pub features: serde_json::Value,
    /// Numeric limits as an object of integers. A value of -1 means
    /// unlimited.
    pub limits: serde_json::Value,
    /// Inactive plans are hidden and cannot be purchased.
    pub active: bool,
}

impl StoredPlan {
    /// The provider price reference for the given interval, if configured.
    #[must_use]
    pub fn price_id_for(&self, interval: BillingInterval) -> Option<&str> {
        match interval {
            BillingInterval::Monthly => self.monthly_price_id.as_deref(),
            BillingInterval::Yearly => self.yearly_price_id.as_deref(),
        }
    }

    /// Whether the plan enables the given feature toggle.
    #[must_use]
    pub fn has_feature(&self, key: &str) -> bool {
        self.features
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// The numeric limit for the given key, if the plan defines one.
    /// -1 means unlimited.
    #[must_use]
    pub fn limit(&self, key: &str) -> Option<i64> {
        self.limits.get(key).and_then(serde_json::Value::as_i64)
    }

    /// Whether `count` items fit under the named limit.
    ///
    /// An undefined limit denies, so forgetting to configure one fails
    /// closed.
    #[must_use]
    pub fn within_limit(&self, key: &str, count: i64) -> bool {
        match self.limit(key) {
            Some(-1) => true,
            Some(limit) => count < limit,
            None => false,
        }
    }
}

/// Read access to the plan catalog.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Look up a plan by its ID, active or not.
    async fn find_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>>;

    /// Active plans offered to the given audience.
    async fn list_active(&self, audience: TenantKind) -> Result<Vec<StoredPlan>>;
}

/// Access to subscription records.
///
/// There is deliberately no general insert here. Subscription rows come
/// into existence only through the provisioner's atomic account
/// creation.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// The subscription for the tenant the filter was issued for.
    async fn find_for_tenant(&self, filter: &TenantFilter) -> Result<Option<Subscription>>;

    /// Look up by the provider's subscription ID.
    async fn find_by_provider_ref(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>>;

    /// Sync status and period end from a provider event.
    ///
    /// Returns `false` when no subscription matches, which callers treat
    /// as an out-of-order event rather than an error.
    async fn update_status(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<bool>;
}

/// In-memory plan catalog backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    plans: RwLock<HashMap<String, StoredPlan>>,
}

impl InMemoryPlanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plan, replacing any existing one with the same ID.
    pub async fn insert(&self, plan: StoredPlan) {
        self.plans.write().await.insert(plan.id.clone(), plan);
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn find_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>> {
        Ok(self.plans.read().await.get(plan_id).cloned())
    }

    async fn list_active(&self, audience: TenantKind) -> Result<Vec<StoredPlan>> {
        let mut plans: Vec<StoredPlan> = self
            .plans
            .read()
            .await
            .values()
            .filter(|plan| plan.active && plan.audience == audience)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(plans)
    }
}

/// In-memory subscription store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, Subscription>>,
}

impl InMemorySubscriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription row directly. The provisioner uses this; tests
    /// use it to seed state.
    pub async fn insert(&self, subscription: Subscription) {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id.clone(), subscription);
    }

    /// Number of stored subscriptions.
    pub async fn count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_for_tenant(&self, filter: &TenantFilter) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .filter(|sub| sub.tenant_id == filter.tenant_id())
            .max_by_key(|sub| sub.created_at)
            .cloned())
    }

    async fn find_by_provider_ref(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|sub| sub.provider_subscription_id == provider_subscription_id)
            .cloned())
    }

    async fn update_status(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let mut subscriptions = self.subscriptions.write().await;
        let Some(subscription) = subscriptions
            .values_mut()
            .find(|sub| sub.provider_subscription_id == provider_subscription_id)
        else {
            return Ok(false);
        };

        subscription.status = status;
        if current_period_end.is_some() {
            subscription.current_period_end = current_period_end;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::TenantFilter;

    fn plan(id: &str, audience: TenantKind, active: bool) -> StoredPlan {
        StoredPlan {
            id: id.to_string(),
            name: id.to_string(),
            audience,
            monthly_price_id: Some(format!("price_{id}_monthly")),
            yearly_price_id: None,
            monthly_price_cents: Some(14900),
            yearly_price_cents: None,
            currency: "brl".to_string(),
            features: serde_json::json!({ "reports": true, "client_portal": false }),
            limits: serde_json::json!({ "clients": 50, "documents_gb": -1 }),
            active,
        }
    }

    fn subscription(id: &str, tenant_id: &str, provider_ref: &str) -> Subscription {
        Subscription {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            plan_id: "contador-pro".to_string(),
            interval: BillingInterval::Monthly,
            status: SubscriptionStatus::Active,
            provider_subscription_id: provider_ref.to_string(),
            current_period_end: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_id_per_interval() {
        let plan = plan("contador-pro", TenantKind::Accountant, true);
        assert_eq!(
            plan.price_id_for(BillingInterval::Monthly),
            Some("price_contador-pro_monthly")
        );
        assert_eq!(plan.price_id_for(BillingInterval::Yearly), None);
    }

    #[test]
    fn test_feature_and_limit_lookups() {
        let plan = plan("contador-pro", TenantKind::Accountant, true);

        assert!(plan.has_feature("reports"));
        assert!(!plan.has_feature("client_portal"));
        assert!(!plan.has_feature("never_configured"));

        assert_eq!(plan.limit("clients"), Some(50));
        assert!(plan.within_limit("clients", 49));
        assert!(!plan.within_limit("clients", 50));
        // -1 is unlimited.
        assert!(plan.within_limit("documents_gb", 1_000_000));
        // Unconfigured limits fail closed.
        assert!(!plan.within_limit("never_configured", 0));
    }

    #[tokio::test]
    async fn test_list_active_filters_audience_and_state() {
        let store = InMemoryPlanStore::new();
        store.insert(plan("contador-pro", TenantKind::Accountant, true)).await;
        store.insert(plan("contador-basico", TenantKind::Accountant, true)).await;
        store.insert(plan("contador-legado", TenantKind::Accountant, false)).await;
        store.insert(plan("autonomo", TenantKind::Client, true)).await;

        let firm_plans = store.list_active(TenantKind::Accountant).await.unwrap();
        let ids: Vec<&str> = firm_plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["contador-basico", "contador-pro"]);

        // Inactive plans are still findable by ID, checkout decides what
        // to do with them.
        assert!(store.find_plan("contador-legado").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_for_tenant_respects_filter() {
        let store = InMemorySubscriptionStore::new();
        store.insert(subscription("sub-1", "tenant-1", "psub_1")).await;
        store.insert(subscription("sub-2", "tenant-2", "psub_2")).await;

        let filter = TenantFilter::new("tenant-1");
        let found = store.find_for_tenant(&filter).await.unwrap().unwrap();
        assert_eq!(found.id, "sub-1");

        let filter = TenantFilter::new("tenant-3");
        assert!(store.find_for_tenant(&filter).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_by_provider_ref() {
        let store = InMemorySubscriptionStore::new();
        store.insert(subscription("sub-1", "tenant-1", "psub_1")).await;

        let period_end = Utc::now() + chrono::Duration::days(30);
        let updated = store
            .update_status("psub_1", SubscriptionStatus::PastDue, Some(period_end))
            .await
            .unwrap();
        assert!(updated);

        let sub = store.find_by_provider_ref("psub_1").await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.current_period_end, Some(period_end));

        // Unknown refs report no match instead of failing.
        let updated = store
            .update_status("psub_unknown", SubscriptionStatus::Canceled, None)
            .await
            .unwrap();
        assert!(!updated);
    }
}
