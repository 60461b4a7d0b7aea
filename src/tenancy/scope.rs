//! Scoped-query proof values.

use super::context::TenantContext;
use super::error::TenancyError;

/// Proof that a query is scoped to one tenant.
///
/// Listing operations pass the authorization guard without a resource
/// id, which moves the leak hazard to the data layer: an unscoped query
/// there would return rows across tenants. Store methods that read
/// tenant-owned rows therefore take a `TenantFilter` instead of a raw
/// id. The only ways to obtain one are [`TenantFilter::from_context`]
/// and a successful guard decision, so a tenant-owned query without an
/// authorized scope does not typecheck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFilter {
    tenant_id: String,
}

impl TenantFilter {
    pub(crate) fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }

    /// Scope to the ambient tenant bound by the context carrier.
    ///
    /// Fails with [`TenancyError::MissingTenantContext`] when no tenant
    /// is bound, which is exactly the case where an unscoped query must
    /// not run.
    pub fn from_context() -> Result<Self, TenancyError> {
        Ok(Self::new(TenantContext::require()?))
    }

    /// The tenant this filter narrows to.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}
