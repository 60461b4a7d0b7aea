//! A fully wired in-memory application for integration tests.

use axum::Router;
use chrono::Utc;
use secrecy::SecretString;

use super::scenario::{ScenarioAssert, post};
use crate::billing::StoredPlan;
use crate::config::{Config, ConfigBuilder};
use crate::http::{AppState, InMemoryApp, SIGNATURE_HEADER, build_router};
use crate::provisioning::WebhookVerifier;

/// JWT signing secret used by [`TestApp`].
pub const TEST_JWT_SECRET: &str = "tallyward-test-jwt-secret-0123456789abcdef";
/// Webhook signing secret used by [`TestApp`].
pub const TEST_WEBHOOK_SECRET: &str = "whsec_tallyward_test";

/// In-memory application plus the concrete store handles tests seed and
/// inspect.
///
/// Built on known test secrets, so helpers can sign webhook deliveries
/// that pass verification and log users in over the real login route.
pub struct TestApp {
    pub app: InMemoryApp,
    pub config: Config,
}

impl TestApp {
    /// Build an app with test secrets and an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        let config = ConfigBuilder::new()
            .with_jwt_secret(TEST_JWT_SECRET.to_string())
            .with_webhook_secret(TEST_WEBHOOK_SECRET.to_string())
            .build()
            .expect("default test config is valid");
        let app = AppState::in_memory(&config);
        Self { app, config }
    }

    /// A fresh router over the shared state.
    ///
    /// Routers are cheap to build, so each request takes its own and the
    /// stores stay shared behind it.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.app.state.clone())
    }

    /// Add a plan to the catalog.
    pub async fn seed_plan(&self, plan: StoredPlan) {
        self.app.plans.insert(plan).await;
    }

    /// Sign a webhook payload the way the payment provider would.
    #[must_use]
    pub fn sign_webhook(&self, payload: &[u8]) -> String {
        WebhookVerifier::new(SecretString::new(TEST_WEBHOOK_SECRET.into()))
            .sign(payload, Utc::now().timestamp())
    }

    /// POST a signed webhook delivery.
    pub async fn deliver_webhook(&self, body: &serde_json::Value) -> ScenarioAssert {
        let payload = serde_json::to_vec(body).expect("webhook body serializes");
        let signature = self.sign_webhook(&payload);
        post(self.router(), "/webhooks/billing")
            .header(SIGNATURE_HEADER, &signature)
            .header("content-type", "application/json")
            .text_body(String::from_utf8(payload).expect("webhook body is utf-8"))
            .execute()
            .await
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body: serde_json::Value = post(self.router(), "/auth/login")
            .json_body(&serde_json::json!({"email": email, "password": password}))
            .execute()
            .await
            .assert_ok()
            .json()
            .await;
        body["token"]
            .as_str()
            .expect("login response carries a token")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
