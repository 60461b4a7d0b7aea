//! The authorization guard: may this caller touch that tenant's data?

use std::sync::Arc;

use super::error::TenancyError;
use super::scope::TenantFilter;
use super::storage::TenantStore;
use super::types::{Caller, Role};
use crate::error::Result;

/// Decides whether a caller may act on a resource owned by a given
/// tenant.
///
/// The rules form a single-hop hierarchy, not a graph traversal:
///
/// 1. No declared owner on the request: allow, and leave scoping to the
///    data layer (see [`TenantFilter`]).
/// 2. A caller with no tenant of its own fails with
///    [`TenancyError::NoTenantContext`] - that is a pipeline problem,
///    not a legitimate refusal.
/// 3. The caller's own tenant: allow.
/// 4. An accountant caller targeting one of its managed client tenants:
///    allow. Delegation stops there; a firm cannot reach through a
///    client to anything else, and a client can never act for anyone.
/// 5. Everything else: [`TenancyError::TenantAccessDenied`].
pub struct TenantGuard {
    tenants: Arc<dyn TenantStore>,
}

impl TenantGuard {
    pub fn new(tenants: Arc<dyn TenantStore>) -> Self {
        Self { tenants }
    }

    /// Evaluate the access rules for `caller` against the resource's
    /// declared owner.
    ///
    /// On allow with a declared owner, returns the [`TenantFilter`]
    /// proving the decision, ready to hand to the data layer. On allow
    /// without one (`resource_tenant_id` is `None`), returns `None`; the
    /// handler must scope its queries itself, normally via
    /// [`TenantFilter::from_context`].
    ///
    /// A failed client-tenant lookup in step 4 is a deny, not an error;
    /// storage failures still propagate.
    pub async fn authorize(
        &self,
        caller: &Caller,
        resource_tenant_id: Option<&str>,
    ) -> Result<Option<TenantFilter>> {
        let Some(resource) = resource_tenant_id else {
            return Ok(None);
        };

        let Some(own_tenant_id) = caller.tenant_id() else {
            return Err(TenancyError::NoTenantContext.into());
        };

        if resource == own_tenant_id {
            return Ok(Some(TenantFilter::new(resource)));
        }

        match caller.role {
            Role::Accountant => {
                if let Some(client) = self.tenants.find_client(resource).await? {
                    if client.accountant_tenant_id.as_deref() == Some(own_tenant_id) {
                        tracing::debug!(
                            user_id = %caller.user_id,
                            accountant_tenant_id = %own_tenant_id,
                            client_tenant_id = %resource,
                            "Firm access to managed client allowed"
                        );
                        return Ok(Some(TenantFilter::new(resource)));
                    }
                }
            }
            Role::Client | Role::Admin => {}
        }

        tracing::debug!(
            user_id = %caller.user_id,
            caller_tenant_id = %own_tenant_id,
            resource_tenant_id = %resource,
            "Tenant access denied"
        );
        Err(TenancyError::TenantAccessDenied {
            resource_tenant_id: resource.to_string(),
        }
        .into())
    }
}
