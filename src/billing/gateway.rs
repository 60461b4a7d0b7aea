//! Payment provider abstraction.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// A hosted checkout session created at the provider.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutSession {
    /// Provider session ID.
    pub id: String,
    /// URL to redirect the customer to.
    pub url: String,
}

/// Request to create a hosted checkout session.
///
/// The metadata map is attached both to the session itself and to the
/// subscription the session spawns, so webhooks on either object can
/// recover the signup intent.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub customer_email: String,
    /// Provider price reference to subscribe to.
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
}

/// Provider operations needed by the checkout flow.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a subscription-mode checkout session.
    async fn create_checkout_session(&self, request: CreateSessionRequest)
        -> Result<CheckoutSession>;
}

/// Mock payment gateway for tests and local development.
///
/// Records every request it receives and can be primed to fail, which is
/// how tests exercise the retryable session-creation failure path.
#[derive(Default)]
pub struct MockGateway {
    session_counter: AtomicU64,
    queued_failures: Mutex<u32>,
    requests: Mutex<Vec<CreateSessionRequest>>,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` session creations fail.
    pub async fn fail_next(&self, count: u32) {
        *self.queued_failures.lock().await += count;
    }

    /// Number of sessions created so far.
    pub fn session_count(&self) -> u64 {
        self.session_counter.load(Ordering::SeqCst)
    }

    /// Copies of every request received, in order.
    pub async fn requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession> {
        self.requests.lock().await.push(request);

        {
            let mut failures = self.queued_failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(crate::billing::BillingError::CheckoutSessionCreationFailed {
                    message: "simulated provider outage".to_string(),
                }
                .into());
            }
        }

        let id = format!("cs_test_{}", self.session_counter.fetch_add(1, Ordering::SeqCst));
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{}", id),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateSessionRequest {
        CreateSessionRequest {
            customer_email: "ana@escritoriofreitas.com.br".to_string(),
            price_id: "price_123".to_string(),
            success_url: "https://app.exemplo.com.br/sucesso".to_string(),
            cancel_url: "https://app.exemplo.com.br/cancelado".to_string(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_mock_issues_distinct_sessions() {
        let gateway = MockGateway::new();
        let first = gateway.create_checkout_session(request()).await.unwrap();
        let second = gateway.create_checkout_session(request()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(first.url.contains(&first.id));
        assert_eq!(gateway.session_count(), 2);
        assert_eq!(gateway.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_primed_failures_then_recovery() {
        let gateway = MockGateway::new();
        gateway.fail_next(1).await;

        let err = gateway.create_checkout_session(request()).await.unwrap_err();
        assert_eq!(err.code(), Some("CHECKOUT_SESSION_CREATION_FAILED"));
        assert_eq!(gateway.session_count(), 0);

        // The failure queue is drained, the next attempt goes through.
        assert!(gateway.create_checkout_session(request()).await.is_ok());
    }
}
