//! Ambient tenant context behavior under concurrency.
//!
//! The carrier is task-local. A scope opened for one request must never
//! be observable from another, however the executor interleaves them,
//! and nothing bound inside a scope may survive it.

use std::time::Duration;

use chrono::Utc;
use tallyward::auth::{PasswordHasher, User};
use tallyward::billing::{BillingInterval, Subscription, SubscriptionStatus};
use tallyward::tenancy::{Role, TenancyError, TenantContext, TenantFilter};
use tallyward::testing::{TestApp, get};

const PASSWORD: &str = "senha-do-escritorio-1";

#[tokio::test]
async fn test_context_is_task_local_under_interleaving() {
    let first = TenantContext::run(Some("tenant-a".to_string()), async {
        for _ in 0..25 {
            assert_eq!(TenantContext::current().as_deref(), Some("tenant-a"));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });
    let second = TenantContext::run(Some("tenant-b".to_string()), async {
        for _ in 0..25 {
            assert_eq!(TenantContext::current().as_deref(), Some("tenant-b"));
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    tokio::join!(first, second);
}

#[tokio::test]
async fn test_spawned_tasks_do_not_inherit_the_scope() {
    TenantContext::run(Some("tenant-a".to_string()), async {
        let observed = tokio::spawn(async { TenantContext::current() })
            .await
            .unwrap();
        assert_eq!(observed, None);
    })
    .await;
}

#[tokio::test]
async fn test_nothing_survives_the_scope() {
    assert_eq!(TenantContext::current(), None);

    TenantContext::run(Some("tenant-a".to_string()), async {
        assert_eq!(TenantContext::current().as_deref(), Some("tenant-a"));
        assert_eq!(TenantFilter::from_context().unwrap().tenant_id(), "tenant-a");
    })
    .await;

    assert_eq!(TenantContext::current(), None);
    assert!(matches!(
        TenantFilter::from_context(),
        Err(TenancyError::MissingTenantContext)
    ));
}

#[tokio::test]
async fn test_binding_outside_a_scope_is_misuse() {
    assert!(matches!(
        TenantContext::bind("tenant-a"),
        Err(TenancyError::ContextMisuse)
    ));
    assert!(matches!(
        TenantContext::require(),
        Err(TenancyError::MissingTenantContext)
    ));
}

#[tokio::test]
async fn test_a_scope_binds_at_most_once() {
    TenantContext::run(None, async {
        assert_eq!(TenantContext::current(), None);

        TenantContext::bind("tenant-a").unwrap();
        assert_eq!(TenantContext::current().as_deref(), Some("tenant-a"));

        assert!(matches!(
            TenantContext::bind("tenant-b"),
            Err(TenancyError::ContextMisuse)
        ));
        // The first binding survives the rejected attempt.
        assert_eq!(TenantContext::current().as_deref(), Some("tenant-a"));
    })
    .await;

    TenantContext::run(Some("tenant-a".to_string()), async {
        assert!(matches!(
            TenantContext::bind("tenant-b"),
            Err(TenancyError::ContextMisuse)
        ));
    })
    .await;
}

#[tokio::test]
async fn test_nested_scopes_shadow_and_restore() {
    TenantContext::run(Some("tenant-outer".to_string()), async {
        TenantContext::run(Some("tenant-inner".to_string()), async {
            assert_eq!(TenantContext::current().as_deref(), Some("tenant-inner"));
        })
        .await;

        assert_eq!(TenantContext::current().as_deref(), Some("tenant-outer"));
    })
    .await;
}

/// Seed a firm user with an active subscription. The subscription read
/// goes through the ambient filter only, so no tenant row is needed.
async fn seed_firm_with_subscription(test: &TestApp, slug: &str, plan_id: &str) -> String {
    let tenant_id = format!("tenant-{slug}");
    let email = format!("{slug}@exemplo.com.br");

    test.app
        .users
        .insert(User {
            id: format!("user-{slug}"),
            email: email.clone(),
            password_hash: PasswordHasher::default().hash(PASSWORD).unwrap(),
            role: Role::Accountant,
            accountant_tenant_id: Some(tenant_id.clone()),
            client_tenant_id: None,
            active: true,
            created_at: Utc::now(),
        })
        .await;
    test.app
        .subscriptions
        .insert(Subscription {
            id: format!("sub-{slug}"),
            tenant_id,
            plan_id: plan_id.to_string(),
            interval: BillingInterval::Monthly,
            status: SubscriptionStatus::Active,
            provider_subscription_id: format!("sub_prov_{slug}"),
            current_period_end: None,
            created_at: Utc::now(),
        })
        .await;

    email
}

#[tokio::test]
async fn test_concurrent_requests_each_see_their_own_subscription() {
    let test = TestApp::new();
    let ana = seed_firm_with_subscription(&test, "freitas", "contador-pro").await;
    let bia = seed_firm_with_subscription(&test, "barros", "contador-basico").await;

    let ana_token = test.login(&ana, PASSWORD).await;
    let bia_token = test.login(&bia, PASSWORD).await;

    for _ in 0..8 {
        let ana_read = async {
            get(test.router(), "/billing/subscription")
                .bearer_token(&ana_token)
                .execute()
                .await
                .assert_ok()
                .json::<serde_json::Value>()
                .await
        };
        let bia_read = async {
            get(test.router(), "/billing/subscription")
                .bearer_token(&bia_token)
                .execute()
                .await
                .assert_ok()
                .json::<serde_json::Value>()
                .await
        };

        let (ana_view, bia_view) = tokio::join!(ana_read, bia_read);
        assert_eq!(ana_view["plan_id"], "contador-pro");
        assert_eq!(bia_view["plan_id"], "contador-basico");
    }
}
