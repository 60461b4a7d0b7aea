//! Webhook-driven account provisioning.
//!
//! No account rows exist until the payment provider confirms a completed
//! checkout. This module receives those confirmations, verifies them,
//! and creates the User, Tenant and Subscription exactly once no matter
//! how many times the provider delivers the event.
//!
//! ```ignore
//! use tallyward::provisioning::{Provisioner, WebhookOutcome};
//!
//! let outcome = provisioner.handle_delivery(&body, &signature_header).await?;
//! match outcome {
//!     WebhookOutcome::Provisioned => { /* new account live */ }
//!     WebhookOutcome::SubscriptionSynced => { /* status updated */ }
//!     WebhookOutcome::AlreadyProcessed | WebhookOutcome::Ignored => {}
//! }
//! ```

mod error;
mod provisioner;
mod storage;
mod webhook;

pub use error::ProvisioningError;
pub use provisioner::{Provisioner, WebhookOutcome};
pub use storage::{InMemoryProvisioningStore, NewAccount, ProvisionOutcome, ProvisioningStore};
pub use webhook::{WebhookEvent, WebhookEventData, WebhookVerifier};
