//! Tenancy-specific error types.

use std::fmt;

/// Errors raised by the context carrier and the authorization guard.
///
/// Each variant carries a stable identifier (see [`TenancyError::code`])
/// so clients can branch on the reason without parsing message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenancyError {
    /// An operation that needs the ambient tenant ran without one bound.
    /// This points at a mis-assembled pipeline, not at the caller.
    MissingTenantContext,
    /// The carrier was written outside an active scope, or rebound after
    /// a value was already set for the scope.
    ContextMisuse,
    /// The caller reached a tenant-scoped decision with no tenant of its
    /// own. Distinct from a plain denial: the request pipeline let an
    /// unscoped identity through.
    NoTenantContext,
    /// The caller may not act on the requested tenant's resources.
    TenantAccessDenied { resource_tenant_id: String },
}

impl fmt::Display for TenancyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTenantContext => {
                write!(f, "No tenant context bound for the current operation")
            }
            Self::ContextMisuse => {
                write!(f, "Tenant context written outside an active scope")
            }
            Self::NoTenantContext => {
                write!(f, "Caller has no tenant context")
            }
            Self::TenantAccessDenied { resource_tenant_id } => {
                write!(f, "Access to tenant '{}' denied", resource_tenant_id)
            }
        }
    }
}

impl std::error::Error for TenancyError {}

impl TenancyError {
    /// Stable machine-readable identifier for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTenantContext => "MISSING_TENANT_CONTEXT",
            Self::ContextMisuse => "CONTEXT_MISUSE",
            Self::NoTenantContext => "NO_TENANT_CONTEXT",
            Self::TenantAccessDenied { .. } => "TENANT_ACCESS_DENIED",
        }
    }

    /// Check if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NoTenantContext | Self::TenantAccessDenied { .. })
    }
}

impl From<TenancyError> for crate::error::TallywardError {
    fn from(err: TenancyError) -> Self {
        match &err {
            // Pipeline misconfiguration: logged at full detail, but the
            // response body stays generic.
            TenancyError::MissingTenantContext | TenancyError::ContextMisuse => {
                crate::error::TallywardError::Internal(err.to_string())
            }

            // Authorization refusals keep their stable code in the body.
            TenancyError::NoTenantContext | TenancyError::TenantAccessDenied { .. } => {
                crate::error::TallywardError::domain(err.code(), 403, err.to_string())
            }
        }
    }
}
