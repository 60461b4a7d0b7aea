//! Tenant identity, isolation, and the firm-to-client delegation rules.
//!
//! Tallyward serves two kinds of tenants from one database: accounting
//! firms and the individual clients they manage. This module owns
//! everything that keeps their data apart:
//!
//! - **Context carrier** ([`TenantContext`]) - a task-scoped binding of
//!   the current caller's tenant id, set once per request and readable
//!   anywhere below the middleware without parameter threading.
//! - **Authorization guard** ([`TenantGuard`]) - decides whether the
//!   caller may act on a resource owned by a given tenant, including the
//!   single-hop rule that lets a firm act on its own clients.
//! - **Scoped queries** ([`TenantFilter`]) - a proof value the data layer
//!   demands before running tenant-owned listing queries, so an unscoped
//!   query is a compile error rather than a code-review convention.
//!
//! # Example
//!
//! ```rust
//! use tallyward::tenancy::{TenantContext, TenantFilter};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let summary = TenantContext::run(Some("tenant-1".to_string()), async {
//!     // Anything awaited in here sees the same binding.
//!     let filter = TenantFilter::from_context().unwrap();
//!     format!("scoped to {}", filter.tenant_id())
//! })
//! .await;
//! assert_eq!(summary, "scoped to tenant-1");
//! # }
//! ```

mod context;
mod error;
mod guard;
mod scope;
mod storage;
mod types;

pub use context::TenantContext;
pub use error::TenancyError;
pub use guard::TenantGuard;
pub use scope::TenantFilter;
pub use storage::{InMemoryTenantStore, TenantStore};
pub use types::{
    AccountantTenant, Caller, ClientModules, ClientTenant, ParseRoleError, Role, Tenant,
    TenantKind,
};
