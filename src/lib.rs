//! Tallyward - multi-tenant backend for the Tallyward accounting platform
//!
//! Tallyward serves accounting firms and the individual clients they manage
//! from a single deployment, built on Axum and Tokio. Every request runs
//! inside a task-scoped tenant context, and every tenant-owned query must
//! present proof that it was scoped.
//!
//! # Features
//!
//! - **Tenancy**: task-local tenant context, firm-to-client authorization,
//!   compile-time scoped queries
//! - **Auth**: JWT logins backed by Argon2 password hashes
//! - **Billing**: hosted checkout sessions with signup data carried in
//!   provider metadata
//! - **Provisioning**: idempotent webhook handling that creates the full
//!   account graph exactly once
//! - **Email**: SMTP and console mailers for transactional mail
//! - **Database**: optional SeaORM persistence with migrations
//! - **Testing**: in-memory stores and a scripted payment gateway
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tallyward::config::ConfigBuilder;
//! use tallyward::http::{AppState, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tallyward::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let app = AppState::in_memory(&config);
//!
//!     serve(config, app.state).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod billing;
pub mod config;
#[cfg(feature = "database")]
pub mod database;
pub mod email;
mod error;
pub mod http;
pub mod provisioning;
pub mod tenancy;
pub mod testing;
pub mod traits;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use error::{Result, TallywardError};
pub use http::{AppState, serve};
pub use tenancy::{TenantContext, TenantFilter, TenantGuard};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before building the app state.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "tallyward=debug")
/// - `TALLYWARD_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// use tallyward;
///
/// #[tokio::main]
/// async fn main() {
///     tallyward::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("TALLYWARD_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from the logging section of a loaded [`Config`].
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
