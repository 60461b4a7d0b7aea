//! Ambient tenant identity for the current task.
//!
//! Request handling is concurrent, so the current tenant can never live
//! in a process-wide slot. The carrier is a tokio task-local: each
//! logical task gets its own binding for the dynamic extent of one
//! [`TenantContext::run`] call, surviving await points inside that
//! extent and invisible to every other task. Nested scopes shadow the
//! outer binding and restore it on exit.

use std::cell::RefCell;
use std::future::Future;

use super::error::TenancyError;

tokio::task_local! {
    static TENANT_ID: RefCell<Option<String>>;
}

/// The per-task carrier of the caller's tenant id.
///
/// The identity middleware opens a scope with [`TenantContext::run`] for
/// every request and binds the resolved tenant once via
/// [`TenantContext::bind`]. Downstream code reads the binding with
/// [`TenantContext::current`] or [`TenantContext::require`]; it cannot
/// rebind it, and writes outside an active scope fail with
/// [`TenancyError::ContextMisuse`].
pub struct TenantContext;

impl TenantContext {
    /// Run `operation` with `tenant_id` bound as the ambient tenant for
    /// its entire extent, including across suspension points. Returns the
    /// operation's output; panics and errors propagate unchanged.
    ///
    /// Passing `None` opens an anonymous scope, which is how the identity
    /// middleware wraps a request before the credential is resolved.
    pub async fn run<F>(tenant_id: Option<String>, operation: F) -> F::Output
    where
        F: Future,
    {
        TENANT_ID.scope(RefCell::new(tenant_id), operation).await
    }

    /// The ambient tenant id bound by the nearest enclosing
    /// [`TenantContext::run`], or `None` when absent (no scope, or an
    /// anonymous scope that was never bound).
    #[must_use]
    pub fn current() -> Option<String> {
        TENANT_ID
            .try_with(|cell| cell.borrow().clone())
            .ok()
            .flatten()
    }

    /// The ambient tenant id, or [`TenancyError::MissingTenantContext`]
    /// when absent.
    pub fn require() -> Result<String, TenancyError> {
        Self::current().ok_or(TenancyError::MissingTenantContext)
    }

    /// Bind the tenant id inside the current scope.
    ///
    /// The slot is write-once per scope: binding outside an active
    /// [`TenantContext::run`], or binding when a value is already set,
    /// fails with [`TenancyError::ContextMisuse`]. Nested scopes get a
    /// fresh slot and may bind their own value.
    pub fn bind(tenant_id: impl Into<String>) -> Result<(), TenancyError> {
        TENANT_ID
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                if slot.is_some() {
                    Err(TenancyError::ContextMisuse)
                } else {
                    *slot = Some(tenant_id.into());
                    Ok(())
                }
            })
            .unwrap_or(Err(TenancyError::ContextMisuse))
    }
}
