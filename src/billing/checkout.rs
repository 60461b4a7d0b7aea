//! Checkout session creation for new signups.
//!
//! Both signup flows converge here: validate, hash the password, hand
//! the whole intent to the payment provider, and return the redirect
//! URL. Nothing is written to local storage; account creation happens
//! only when the provider confirms payment through a webhook.

use crate::auth::{PasswordHasher, UserStore};
use crate::billing::error::BillingError;
use crate::billing::gateway::{CheckoutSession, CreateSessionRequest, PaymentGateway};
use crate::billing::intent::CheckoutIntent;
use crate::billing::storage::PlanStore;
use crate::billing::subscription::BillingInterval;
use crate::config::BillingConfig;
use crate::error::{Result, TallywardError};
use crate::tenancy::{TenantKind, TenantStore};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use validator::Validate;

/// Redirect URLs for hosted checkout.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            success_url: "http://localhost:8000/checkout/success".to_string(),
            cancel_url: "http://localhost:8000/checkout/cancelled".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Take the redirect URLs from the application billing configuration.
    #[must_use]
    pub fn from_billing(billing: &BillingConfig) -> Self {
        Self {
            success_url: billing.success_url.clone(),
            cancel_url: billing.cancel_url.clone(),
        }
    }
}

/// Signup request for an accounting firm.
#[derive(Clone, Deserialize, Validate)]
pub struct FirmSignup {
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    /// Professional registry number (e.g. CRC)
    #[validate(length(min = 1, max = 50))]
    pub registration_number: String,
    /// CNPJ, formatted or digits-only
    #[validate(length(min = 11, max = 18))]
    pub fiscal_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1))]
    pub plan_id: String,
    pub interval: BillingInterval,
}

impl fmt::Debug for FirmSignup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmSignup")
            .field("company_name", &self.company_name)
            .field("fiscal_id", &self.fiscal_id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("plan_id", &self.plan_id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Signup request for an individual client.
#[derive(Clone, Deserialize, Validate)]
pub struct IndividualSignup {
    #[validate(length(min = 1, max = 200))]
    pub display_name: String,
    /// CPF, formatted or digits-only
    #[validate(length(min = 11, max = 18))]
    pub fiscal_id: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1))]
    pub plan_id: String,
    pub interval: BillingInterval,
}

impl fmt::Debug for IndividualSignup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndividualSignup")
            .field("display_name", &self.display_name)
            .field("fiscal_id", &self.fiscal_id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("plan_id", &self.plan_id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

struct NormalizedSignup {
    kind: TenantKind,
    email: String,
    password: String,
    fiscal_id: String,
    plan_id: String,
    interval: BillingInterval,
    company_name: Option<String>,
    registration_number: Option<String>,
    display_name: Option<String>,
}

/// Builds provider checkout sessions for new signups.
///
/// Validation is ordered and stops at the first failure: email conflict,
/// then fiscal ID conflict, then plan lookup, then plan configuration.
/// A request that fails several checks reports only the earliest one.
pub struct CheckoutManager {
    users: Arc<dyn UserStore>,
    tenants: Arc<dyn TenantStore>,
    plans: Arc<dyn PlanStore>,
    gateway: Arc<dyn PaymentGateway>,
    passwords: PasswordHasher,
    config: CheckoutConfig,
}

impl CheckoutManager {
    /// Create a new checkout manager.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        tenants: Arc<dyn TenantStore>,
        plans: Arc<dyn PlanStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            users,
            tenants,
            plans,
            gateway,
            passwords: PasswordHasher::default(),
            config,
        }
    }

    /// Replace the password hasher, e.g. with faster parameters in tests.
    #[must_use]
    pub fn with_password_hasher(mut self, passwords: PasswordHasher) -> Self {
        self.passwords = passwords;
        self
    }

    /// Start a firm signup: validate, then create the provider session.
    pub async fn begin_firm_signup(&self, signup: FirmSignup) -> Result<CheckoutSession> {
        let fiscal_id = normalize_fiscal_id(&signup.fiscal_id);
        if fiscal_id.len() != 14 {
            return Err(TallywardError::validation(
                "Fiscal ID must be a CNPJ with 14 digits",
            ));
        }

        self.create_session(NormalizedSignup {
            kind: TenantKind::Accountant,
            email: normalize_email(&signup.email),
            password: signup.password,
            fiscal_id,
            plan_id: signup.plan_id,
            interval: signup.interval,
            company_name: Some(signup.company_name.trim().to_string()),
            registration_number: Some(signup.registration_number.trim().to_string()),
            display_name: None,
        })
        .await
    }

    /// Start an individual client signup.
    pub async fn begin_individual_signup(
        &self,
        signup: IndividualSignup,
    ) -> Result<CheckoutSession> {
        let fiscal_id = normalize_fiscal_id(&signup.fiscal_id);
        if fiscal_id.len() != 11 {
            return Err(TallywardError::validation(
                "Fiscal ID must be a CPF with 11 digits",
            ));
        }

        self.create_session(NormalizedSignup {
            kind: TenantKind::Client,
            email: normalize_email(&signup.email),
            password: signup.password,
            fiscal_id,
            plan_id: signup.plan_id,
            interval: signup.interval,
            company_name: None,
            registration_number: None,
            display_name: Some(signup.display_name.trim().to_string()),
        })
        .await
    }

    async fn create_session(&self, signup: NormalizedSignup) -> Result<CheckoutSession> {
        if self.users.find_by_email(&signup.email).await?.is_some() {
            return Err(BillingError::EmailAlreadyRegistered.into());
        }

        if self.tenants.fiscal_id_exists(&signup.fiscal_id).await? {
            return Err(BillingError::FiscalIdAlreadyRegistered.into());
        }

        // Plans for the other audience stay invisible: requesting one is
        // indistinguishable from requesting a plan that does not exist.
        let plan = match self.plans.find_plan(&signup.plan_id).await? {
            Some(plan) if plan.active && plan.audience == signup.kind => plan,
            _ => {
                return Err(BillingError::PlanNotFound {
                    plan_id: signup.plan_id,
                }
                .into())
            }
        };

        let Some(price_id) = plan.price_id_for(signup.interval) else {
            return Err(BillingError::PlanMisconfigured {
                plan_id: plan.id.clone(),
                reason: format!("no {} price reference", signup.interval),
            }
            .into());
        };

        // The plaintext password ends here.
        let password_hash = self.passwords.hash(&signup.password)?;

        let intent = CheckoutIntent {
            kind: signup.kind,
            email: signup.email,
            password_hash,
            plan_id: plan.id.clone(),
            interval: signup.interval,
            fiscal_id: signup.fiscal_id,
            company_name: signup.company_name,
            registration_number: signup.registration_number,
            display_name: signup.display_name,
        };

        let session = self
            .gateway
            .create_checkout_session(CreateSessionRequest {
                customer_email: intent.email.clone(),
                price_id: price_id.to_string(),
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                metadata: intent.to_metadata(),
            })
            .await?;

        tracing::info!(
            session_id = %session.id,
            kind = %intent.kind,
            plan_id = %intent.plan_id,
            "Checkout session created"
        );
        Ok(session)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_fiscal_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
