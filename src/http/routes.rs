//! Route table and request handlers.
//!
//! Public routes cover signup, login, the plan catalog and the billing
//! webhook. Everything else sits behind [`require_identity`], which
//! resolves the bearer token and opens the per-request tenant scope.

use crate::auth::{CurrentCaller, IssuedToken, require_identity};
use crate::billing::{FirmSignup, IndividualSignup, StoredPlan, SubscriptionStatus};
use crate::error::TallywardError;
use crate::http::response::{Attachment, CreatedResponse, JsonResponse};
use crate::http::state::AppState;
use crate::provisioning::ProvisioningError;
use crate::tenancy::{ClientTenant, TenancyError, TenantFilter, TenantKind};
use crate::validation::ValidatedJson;
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    middleware,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Header carrying the webhook signature, `t=<unix>,v1=<hex>`.
pub const SIGNATURE_HEADER: &str = "Billing-Signature";

/// Assemble the full route table over the given state.
pub fn build_router(state: AppState) -> Router {
    let resolver = Arc::clone(&state.resolver);

    let public = Router::new()
        .route("/health", get(health))
        .route("/plans", get(list_plans))
        .route("/auth/login", post(login))
        .route("/signup/accountant", post(signup_accountant))
        .route("/signup/client", post(signup_client))
        .route("/webhooks/billing", post(billing_webhook));

    let protected = Router::new()
        .route("/billing/subscription", get(my_subscription))
        .route("/clients", get(list_clients))
        .route("/clients/export", get(export_clients))
        .route("/clients/{tenant_id}/summary", get(client_summary))
        .route_layer(middleware::from_fn(require_identity));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(Extension(resolver))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct PlansQuery {
    audience: Option<TenantKind>,
}

/// A plan as shown on the pricing page. Provider price references stay
/// internal.
#[derive(Debug, Serialize)]
struct PlanView {
    id: String,
    name: String,
    audience: TenantKind,
    currency: String,
    monthly_price_cents: Option<i64>,
    yearly_price_cents: Option<i64>,
    features: serde_json::Value,
    limits: serde_json::Value,
}

impl From<StoredPlan> for PlanView {
    fn from(plan: StoredPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            audience: plan.audience,
            currency: plan.currency,
            monthly_price_cents: plan.monthly_price_cents,
            yearly_price_cents: plan.yearly_price_cents,
            features: plan.features,
            limits: plan.limits,
        }
    }
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlansQuery>,
) -> JsonResponse<Vec<PlanView>> {
    let audiences = match query.audience {
        Some(audience) => vec![audience],
        None => vec![TenantKind::Accountant, TenantKind::Client],
    };

    let mut views = Vec::new();
    for audience in audiences {
        for plan in state.plans.list_active(audience).await? {
            views.push(PlanView::from(plan));
        }
    }
    Ok(Json(views))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> JsonResponse<IssuedToken> {
    let issued = state.resolver.login(&req.email, &req.password).await?;
    Ok(Json(issued))
}

/// The provider session a signup redirects to.
#[derive(Debug, Serialize)]
struct CheckoutSessionResponse {
    session_id: String,
    checkout_url: String,
}

async fn signup_accountant(
    State(state): State<AppState>,
    ValidatedJson(signup): ValidatedJson<FirmSignup>,
) -> Result<CreatedResponse<CheckoutSessionResponse>, TallywardError> {
    let session = state.checkout.begin_firm_signup(signup).await?;
    Ok(CreatedResponse {
        data: CheckoutSessionResponse {
            session_id: session.id,
            checkout_url: session.url.clone(),
        },
        location: session.url,
    })
}

async fn signup_client(
    State(state): State<AppState>,
    ValidatedJson(signup): ValidatedJson<IndividualSignup>,
) -> Result<CreatedResponse<CheckoutSessionResponse>, TallywardError> {
    let session = state.checkout.begin_individual_signup(signup).await?;
    Ok(CreatedResponse {
        data: CheckoutSessionResponse {
            session_id: session.id,
            checkout_url: session.url.clone(),
        },
        location: session.url,
    })
}

async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> JsonResponse<serde_json::Value> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ProvisioningError::InvalidWebhookSignature {
            reason: "missing signature header",
        })?;

    let outcome = state.provisioner.handle_delivery(&body, signature).await?;
    Ok(Json(serde_json::json!({ "received": outcome.as_str() })))
}

#[derive(Debug, Serialize)]
struct SubscriptionView {
    plan_id: String,
    interval: crate::billing::BillingInterval,
    status: SubscriptionStatus,
    current_period_end: Option<DateTime<Utc>>,
    grants_access: bool,
}

impl From<crate::billing::Subscription> for SubscriptionView {
    fn from(sub: crate::billing::Subscription) -> Self {
        Self {
            plan_id: sub.plan_id,
            interval: sub.interval,
            status: sub.status,
            current_period_end: sub.current_period_end,
            grants_access: sub.status.grants_access(),
        }
    }
}

/// The caller's own subscription, read through the ambient tenant scope.
async fn my_subscription(
    State(state): State<AppState>,
    CurrentCaller(_caller): CurrentCaller,
) -> JsonResponse<SubscriptionView> {
    // Admins carry no tenant, so nothing was bound for them.
    let filter = TenantFilter::from_context().map_err(|_| TenancyError::NoTenantContext)?;

    let Some(subscription) = state.subscriptions.find_for_tenant(&filter).await? else {
        return Err(TallywardError::not_found("No subscription for this account"));
    };
    Ok(Json(SubscriptionView::from(subscription)))
}

#[derive(Debug, Serialize)]
struct ClientView {
    id: String,
    display_name: String,
    fiscal_id: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<ClientTenant> for ClientView {
    fn from(client: ClientTenant) -> Self {
        Self {
            id: client.id,
            display_name: client.display_name,
            fiscal_id: client.fiscal_id,
            active: client.active,
            created_at: client.created_at,
        }
    }
}

async fn list_clients(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> JsonResponse<Vec<ClientView>> {
    let Some(filter) = state.guard.authorize(&caller, caller.tenant_id()).await? else {
        return Err(TenancyError::NoTenantContext.into());
    };

    let clients = state.tenants.clients_of(&filter).await?;
    Ok(Json(clients.into_iter().map(ClientView::from).collect()))
}

async fn export_clients(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> Result<Attachment, TallywardError> {
    let Some(filter) = state.guard.authorize(&caller, caller.tenant_id()).await? else {
        return Err(TenancyError::NoTenantContext.into());
    };

    let clients = state.tenants.clients_of(&filter).await?;
    Ok(Attachment(state.exporter.export_client_roster(&clients)))
}

#[derive(Debug, Serialize)]
struct TenantSummary {
    tenant_id: String,
    name: String,
    kind: TenantKind,
    active: bool,
    subscription: Option<SubscriptionView>,
}

/// Per-tenant summary, available to the tenant itself and to the firm
/// managing it.
async fn client_summary(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(tenant_id): Path<String>,
) -> JsonResponse<TenantSummary> {
    let Some(filter) = state.guard.authorize(&caller, Some(&tenant_id)).await? else {
        return Err(TallywardError::internal(
            "guard returned no filter for a scoped request",
        ));
    };

    let Some(tenant) = state.tenants.find_tenant(filter.tenant_id()).await? else {
        return Err(TallywardError::not_found(format!(
            "Tenant '{tenant_id}' not found"
        )));
    };

    let subscription = state
        .subscriptions
        .find_for_tenant(&filter)
        .await?
        .map(SubscriptionView::from);

    Ok(Json(TenantSummary {
        tenant_id: tenant.id().to_string(),
        name: tenant.name().to_string(),
        kind: tenant.kind(),
        active: tenant.is_active(),
        subscription,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigBuilder};
    use crate::http::state::InMemoryApp;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn config() -> Config {
        ConfigBuilder::new()
            .with_jwt_secret("a-test-secret-at-least-32-bytes-long".to_string())
            .with_webhook_secret("whsec_test_secret".to_string())
            .build()
            .unwrap()
    }

    fn test_app() -> (Router, InMemoryApp) {
        let app = AppState::in_memory(&config());
        (build_router(app.state.clone()), app)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn firm_plan() -> StoredPlan {
        StoredPlan {
            id: "contador-pro".to_string(),
            name: "Contador Pro".to_string(),
            audience: TenantKind::Accountant,
            monthly_price_id: Some("price_pro_monthly".to_string()),
            yearly_price_id: Some("price_pro_yearly".to_string()),
            monthly_price_cents: Some(14900),
            yearly_price_cents: Some(149_000),
            currency: "brl".to_string(),
            features: serde_json::json!({}),
            limits: serde_json::json!({}),
            active: true,
        }
    }

    fn client_plan() -> StoredPlan {
        StoredPlan {
            id: "autonomo".to_string(),
            name: "Autônomo".to_string(),
            audience: TenantKind::Client,
            monthly_price_id: Some("price_autonomo_monthly".to_string()),
            yearly_price_id: Some("price_autonomo_yearly".to_string()),
            monthly_price_cents: Some(4900),
            yearly_price_cents: Some(49_000),
            currency: "brl".to_string(),
            features: serde_json::json!({}),
            limits: serde_json::json!({}),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint_responds() {
        let (router, _app) = test_app();

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_plans_endpoint_filters_by_audience() {
        let (router, app) = test_app();
        app.plans.insert(firm_plan()).await;
        app.plans.insert(client_plan()).await;

        let response = router
            .clone()
            .oneshot(
                Request::get("/plans?audience=client")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plans = body_json(response).await;
        assert_eq!(plans.as_array().unwrap().len(), 1);
        assert_eq!(plans[0]["id"], "autonomo");
        // Provider price references never leave the catalog.
        assert!(plans[0].get("monthly_price_id").is_none());

        let response = router
            .oneshot(Request::get("/plans").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_signup_rejects_invalid_body_before_any_work() {
        let (router, app) = test_app();

        let response = router
            .oneshot(
                Request::post("/signup/accountant")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"company_name":"Freitas","registration_number":"CRC-SP 1",
                           "fiscal_id":"11.222.333/0001-81","email":"not-an-address",
                           "password":"curta","plan_id":"contador-pro","interval":"monthly"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.gateway.session_count(), 0);
    }

    #[tokio::test]
    async fn test_accountant_signup_returns_provider_session() {
        let (router, app) = test_app();
        app.plans.insert(firm_plan()).await;

        let response = router
            .oneshot(
                Request::post("/signup/accountant")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"company_name":"Escritório Freitas","registration_number":"CRC-SP 123456",
                           "fiscal_id":"11.222.333/0001-81","email":"ana@escritoriofreitas.com.br",
                           "password":"senha-segura-123","plan_id":"contador-pro","interval":"monthly"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = body_json(response).await;
        assert_eq!(body["checkout_url"], location.as_str());
        assert!(body["session_id"].as_str().unwrap().starts_with("cs_"));
        assert_eq!(app.gateway.session_count(), 1);
    }

    #[tokio::test]
    async fn test_webhook_without_signature_header_is_rejected() {
        let (router, app) = test_app();

        let response = router
            .oneshot(
                Request::post("/webhooks/billing")
                    .body(Body::from(r#"{"id":"evt_1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["code"],
            "INVALID_WEBHOOK_SIGNATURE"
        );
        assert_eq!(app.users.count().await, 0);
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_token() {
        let (router, _app) = test_app();

        for path in ["/clients", "/clients/export", "/billing/subscription"] {
            let response = router
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "path {path}");
        }
    }
}
