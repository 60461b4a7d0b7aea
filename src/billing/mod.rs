//! Billing module for subscription signups.
//!
//! Covers the paid half of onboarding: plan catalog lookups, hosted
//! checkout session creation, and the subscription records that webhook
//! provisioning later writes. The flow is deliberately one-way at this
//! stage: a signup produces a provider session carrying the whole
//! signup intent as metadata, and no local rows, so an abandoned
//! checkout leaves nothing behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tallyward::billing::{BillingInterval, CheckoutConfig, CheckoutManager, FirmSignup};
//!
//! let manager = CheckoutManager::new(users, tenants, plans, gateway, CheckoutConfig::default());
//!
//! let session = manager.begin_firm_signup(FirmSignup {
//!     company_name: "Escritório Freitas Contabilidade".into(),
//!     registration_number: "CRC-SP 123456".into(),
//!     fiscal_id: "12.345.678/0001-90".into(),
//!     email: "ana@escritoriofreitas.com.br".into(),
//!     password: "senha-bem-segura".into(),
//!     plan_id: "contador-pro".into(),
//!     interval: BillingInterval::Monthly,
//! }).await?;
//!
//! // Redirect the browser to session.url.
//! ```

pub mod checkout;
pub mod error;
pub mod gateway;
pub mod intent;
pub mod live_gateway;
pub mod storage;
pub mod subscription;

// Checkout exports
pub use checkout::{CheckoutConfig, CheckoutManager, FirmSignup, IndividualSignup};

// Gateway exports
pub use gateway::{CheckoutSession, CreateSessionRequest, MockGateway, PaymentGateway};
pub use live_gateway::{LiveGateway, LiveGatewayConfig};

// Intent exports
pub use intent::{CheckoutIntent, InvalidMetadataField};

// Storage exports
pub use storage::{
    InMemoryPlanStore, InMemorySubscriptionStore, PlanStore, StoredPlan, SubscriptionStore,
};

// Subscription exports
pub use subscription::{
    BillingInterval, ParseBillingIntervalError, Subscription, SubscriptionStatus,
};

// Error exports
pub use error::BillingError;
