//! Tenant persistence trait and the in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::scope::TenantFilter;
use super::types::{ClientTenant, Tenant};
use crate::error::Result;

/// Read access to tenant records.
///
/// The guard and the checkout validation path only ever read tenants;
/// writes happen through the provisioning store as part of its atomic
/// unit.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Look up a tenant of either kind by id.
    async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>>;

    /// Look up a client tenant by id. Returns `None` for unknown ids and
    /// for ids that belong to accountant tenants.
    async fn find_client(&self, tenant_id: &str) -> Result<Option<ClientTenant>>;

    /// True if any tenant of either kind holds this fiscal id.
    async fn fiscal_id_exists(&self, fiscal_id: &str) -> Result<bool>;

    /// The client tenants managed by the filtered tenant, sorted by id.
    ///
    /// Takes the filter rather than a bare id so every roster read has
    /// been through the guard or the ambient context. Empty when the
    /// filtered tenant is itself a client.
    async fn clients_of(&self, filter: &TenantFilter) -> Result<Vec<ClientTenant>>;
}

/// In-memory tenant store.
///
/// Suitable for tests, local development, and as the read side of the
/// in-memory provisioning store.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    tenants: RwLock<HashMap<String, Tenant>>,
}

impl InMemoryTenantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tenant, keyed by id.
    pub async fn insert(&self, tenant: Tenant) {
        self.tenants
            .write()
            .await
            .insert(tenant.id().to_string(), tenant);
    }

    pub async fn count(&self) -> usize {
        self.tenants.read().await.len()
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        Ok(self.tenants.read().await.get(tenant_id).cloned())
    }

    async fn find_client(&self, tenant_id: &str) -> Result<Option<ClientTenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .get(tenant_id)
            .and_then(|t| t.as_client().cloned()))
    }

    async fn fiscal_id_exists(&self, fiscal_id: &str) -> Result<bool> {
        Ok(self
            .tenants
            .read()
            .await
            .values()
            .any(|t| t.fiscal_id() == fiscal_id))
    }

    async fn clients_of(&self, filter: &TenantFilter) -> Result<Vec<ClientTenant>> {
        let mut clients: Vec<ClientTenant> = self
            .tenants
            .read()
            .await
            .values()
            .filter_map(Tenant::as_client)
            .filter(|c| c.accountant_tenant_id.as_deref() == Some(filter.tenant_id()))
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::types::{AccountantTenant, ClientModules};
    use chrono::Utc;

    fn firm(id: &str, fiscal_id: &str) -> Tenant {
        Tenant::Accountant(AccountantTenant {
            id: id.to_string(),
            owner_user_id: format!("u-{id}"),
            company_name: "Contas & Cia".to_string(),
            registration_number: "CRC-1234".to_string(),
            fiscal_id: fiscal_id.to_string(),
            active: true,
            created_at: Utc::now(),
        })
    }

    fn client(id: &str, fiscal_id: &str, firm_id: Option<&str>) -> Tenant {
        Tenant::Client(ClientTenant {
            id: id.to_string(),
            owner_user_id: format!("u-{id}"),
            display_name: "Cliente".to_string(),
            fiscal_id: fiscal_id.to_string(),
            accountant_tenant_id: firm_id.map(str::to_string),
            modules: ClientModules::default(),
            active: true,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_find_tenant_returns_both_kinds() {
        let store = InMemoryTenantStore::new();
        store.insert(firm("t-1", "11222333000181")).await;
        store.insert(client("t-2", "39053344705", Some("t-1"))).await;

        assert!(store.find_tenant("t-1").await.unwrap().is_some());
        assert!(store.find_tenant("t-2").await.unwrap().is_some());
        assert!(store.find_tenant("t-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_client_ignores_accountant_tenants() {
        let store = InMemoryTenantStore::new();
        store.insert(firm("t-1", "11222333000181")).await;
        store.insert(client("t-2", "39053344705", Some("t-1"))).await;

        assert!(store.find_client("t-1").await.unwrap().is_none());
        let found = store.find_client("t-2").await.unwrap().unwrap();
        assert_eq!(found.accountant_tenant_id.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn test_fiscal_id_lookup_spans_both_kinds() {
        let store = InMemoryTenantStore::new();
        store.insert(firm("t-1", "11222333000181")).await;
        store.insert(client("t-2", "39053344705", None)).await;

        assert!(store.fiscal_id_exists("11222333000181").await.unwrap());
        assert!(store.fiscal_id_exists("39053344705").await.unwrap());
        assert!(!store.fiscal_id_exists("00000000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_clients_of_lists_only_the_filtered_firms_clients() {
        let store = InMemoryTenantStore::new();
        store.insert(firm("t-1", "11222333000181")).await;
        store.insert(client("t-2", "39053344705", Some("t-1"))).await;
        store.insert(client("t-3", "52998224725", Some("t-1"))).await;
        store.insert(client("t-4", "11144477735", Some("t-9"))).await;
        store.insert(client("t-5", "16899535009", None)).await;

        let clients = store.clients_of(&TenantFilter::new("t-1")).await.unwrap();
        let ids: Vec<&str> = clients.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["t-2", "t-3"]);

        // A client tenant manages nobody.
        assert!(store.clients_of(&TenantFilter::new("t-2")).await.unwrap().is_empty());
    }
}
