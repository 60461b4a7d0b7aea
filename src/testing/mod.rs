//! Testing utilities for Tallyward.
//!
//! This module provides:
//! - Fluent HTTP endpoint testing without running a server
//! - A fully wired in-memory application with helpers for signed webhook
//!   deliveries and real logins
//! - Generators for domain-shaped fake data
//!
//! # Example
//!
//! ```rust,ignore
//! use tallyward::testing::{TestApp, firm_plan, get};
//!
//! #[tokio::test]
//! async fn test_plans_are_public() {
//!     let app = TestApp::new();
//!     app.seed_plan(firm_plan()).await;
//!
//!     get(app.router(), "/plans")
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_json_field("0.id", serde_json::json!("contador-pro"))
//!         .await;
//! }
//! ```

mod app;
mod fixtures;
mod scenario;

pub use app::{TEST_JWT_SECRET, TEST_WEBHOOK_SECRET, TestApp};
pub use fixtures::{client_plan, fake, firm_plan};
pub use scenario::{Scenario, ScenarioAssert, get, post};
