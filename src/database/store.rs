//! SeaORM-backed persistence for the whole account graph.
//!
//! One store implements every storage trait the application reads and
//! writes through, so a single connection pool serves identity, tenancy,
//! billing and provisioning. The provisioning transaction claims the
//! webhook event and writes the three account rows as one unit, which is
//! where exactly-once delivery actually lives.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, TryInsertResult,
    entity::prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::time::Duration;

use crate::auth::{User, UserStore};
use crate::billing::{
    BillingInterval, PlanStore, StoredPlan, Subscription, SubscriptionStatus, SubscriptionStore,
};
use crate::database::config::{DatabaseConfig, redact_database_url};
use crate::error::{Result, TallywardError};
use crate::provisioning::{NewAccount, ProvisionOutcome, ProvisioningStore};
use crate::tenancy::{
    AccountantTenant, ClientTenant, Role, Tenant, TenantFilter, TenantKind, TenantStore,
};

// =============================================================================
// SeaORM Entities
// =============================================================================

mod entity {
    use sea_orm::entity::prelude::*;

    pub mod accounts {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "accounts")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            #[sea_orm(unique)]
            pub email: String,
            pub password_hash: String,
            pub role: String,
            pub accountant_tenant_id: Option<String>,
            pub client_tenant_id: Option<String>,
            pub active: bool,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod tenants {
        use super::*;

        /// Both tenant kinds share one table; `kind` discriminates and
        /// `name` holds the company name or display name accordingly.
        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "tenants")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub kind: String,
            pub owner_user_id: String,
            pub name: String,
            pub registration_number: Option<String>,
            #[sea_orm(unique)]
            pub fiscal_id: String,
            pub accountant_tenant_id: Option<String>,
            #[sea_orm(column_type = "JsonBinary", nullable)]
            pub modules: Option<serde_json::Value>,
            pub active: bool,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod plans {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "plans")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub name: String,
            pub audience: String,
            pub monthly_price_id: Option<String>,
            pub yearly_price_id: Option<String>,
            pub monthly_price_cents: Option<i64>,
            pub yearly_price_cents: Option<i64>,
            pub currency: String,
            #[sea_orm(column_type = "JsonBinary")]
            pub features: serde_json::Value,
            #[sea_orm(column_type = "JsonBinary")]
            pub limits: serde_json::Value,
            pub active: bool,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod subscriptions {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "subscriptions")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub tenant_id: String,
            pub plan_id: String,
            pub interval: String,
            pub status: String,
            #[sea_orm(unique)]
            pub provider_subscription_id: String,
            pub current_period_end: Option<DateTimeWithTimeZone>,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod processed_events {
        use super::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "processed_events")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub event_id: String,
            pub processed_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::{accounts, plans, processed_events, subscriptions, tenants};

// =============================================================================
// Converters
// =============================================================================

fn model_to_user(model: accounts::Model) -> Result<User> {
    let role = model.role.parse::<Role>().map_err(|e| {
        TallywardError::Database(format!("account {} has an invalid role: {e}", model.id))
    })?;
    Ok(User {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        role,
        accountant_tenant_id: model.accountant_tenant_id,
        client_tenant_id: model.client_tenant_id,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn user_to_active_model(user: &User) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(user.id.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_string()),
        accountant_tenant_id: Set(user.accountant_tenant_id.clone()),
        client_tenant_id: Set(user.client_tenant_id.clone()),
        active: Set(user.active),
        created_at: Set(user.created_at.fixed_offset()),
    }
}

fn model_to_client(model: tenants::Model) -> Result<ClientTenant> {
    let modules = model
        .modules
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| {
            TallywardError::Database(format!("tenant {} has invalid modules: {e}", model.id))
        })?
        .unwrap_or_default();
    Ok(ClientTenant {
        id: model.id,
        owner_user_id: model.owner_user_id,
        display_name: model.name,
        fiscal_id: model.fiscal_id,
        accountant_tenant_id: model.accountant_tenant_id,
        modules,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn model_to_tenant(model: tenants::Model) -> Result<Tenant> {
    if model.kind == TenantKind::Client.as_str() {
        return model_to_client(model).map(Tenant::Client);
    }
    if model.kind == TenantKind::Accountant.as_str() {
        return Ok(Tenant::Accountant(AccountantTenant {
            id: model.id,
            owner_user_id: model.owner_user_id,
            company_name: model.name,
            registration_number: model.registration_number.unwrap_or_default(),
            fiscal_id: model.fiscal_id,
            active: model.active,
            created_at: model.created_at.with_timezone(&Utc),
        }));
    }
    Err(TallywardError::Database(format!(
        "tenant {} has unknown kind '{}'",
        model.id, model.kind
    )))
}

fn tenant_to_active_model(tenant: &Tenant) -> Result<tenants::ActiveModel> {
    let model = match tenant {
        Tenant::Accountant(t) => tenants::ActiveModel {
            id: Set(t.id.clone()),
            kind: Set(TenantKind::Accountant.as_str().to_string()),
            owner_user_id: Set(t.owner_user_id.clone()),
            name: Set(t.company_name.clone()),
            registration_number: Set(Some(t.registration_number.clone())),
            fiscal_id: Set(t.fiscal_id.clone()),
            accountant_tenant_id: Set(None),
            modules: Set(None),
            active: Set(t.active),
            created_at: Set(t.created_at.fixed_offset()),
        },
        Tenant::Client(t) => {
            let modules = serde_json::to_value(&t.modules).map_err(|e| {
                TallywardError::Database(format!("tenant {} modules not serializable: {e}", t.id))
            })?;
            tenants::ActiveModel {
                id: Set(t.id.clone()),
                kind: Set(TenantKind::Client.as_str().to_string()),
                owner_user_id: Set(t.owner_user_id.clone()),
                name: Set(t.display_name.clone()),
                registration_number: Set(None),
                fiscal_id: Set(t.fiscal_id.clone()),
                accountant_tenant_id: Set(t.accountant_tenant_id.clone()),
                modules: Set(Some(modules)),
                active: Set(t.active),
                created_at: Set(t.created_at.fixed_offset()),
            }
        }
    };
    Ok(model)
}

fn model_to_plan(model: plans::Model) -> Result<StoredPlan> {
    let audience = model.audience.parse::<TenantKind>().map_err(|e| {
        TallywardError::Database(format!("plan {} has an invalid audience: {e}", model.id))
    })?;
    Ok(StoredPlan {
        id: model.id,
        name: model.name,
        audience,
        monthly_price_id: model.monthly_price_id,
        yearly_price_id: model.yearly_price_id,
        monthly_price_cents: model.monthly_price_cents,
        yearly_price_cents: model.yearly_price_cents,
        currency: model.currency,
        features: model.features,
        limits: model.limits,
        active: model.active,
    })
}

fn model_to_subscription(model: subscriptions::Model) -> Result<Subscription> {
    let interval = model.interval.parse::<BillingInterval>().map_err(|e| {
        TallywardError::Database(format!("subscription {} has an invalid interval: {e}", model.id))
    })?;
    Ok(Subscription {
        id: model.id,
        tenant_id: model.tenant_id,
        plan_id: model.plan_id,
        interval,
        status: SubscriptionStatus::from_provider(&model.status),
        provider_subscription_id: model.provider_subscription_id,
        current_period_end: model.current_period_end.map(|end| end.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn subscription_to_active_model(subscription: &Subscription) -> subscriptions::ActiveModel {
    subscriptions::ActiveModel {
        id: Set(subscription.id.clone()),
        tenant_id: Set(subscription.tenant_id.clone()),
        plan_id: Set(subscription.plan_id.clone()),
        interval: Set(subscription.interval.as_str().to_string()),
        status: Set(subscription.status.as_str().to_string()),
        provider_subscription_id: Set(subscription.provider_subscription_id.clone()),
        current_period_end: Set(subscription.current_period_end.map(|end| end.fixed_offset())),
        created_at: Set(subscription.created_at.fixed_offset()),
    }
}

// =============================================================================
// SeaOrmStore
// =============================================================================

/// SeaORM-backed store for users, tenants, plans and subscriptions.
///
/// Cloning is cheap; the underlying [`DatabaseConnection`] is a pool.
#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wrap an existing database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect using the given config, running migrations first when
    /// `auto_migrate` is set.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ConnectOptions::new(&config.url);
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .sqlx_logging(true);

        let db = Database::connect(options).await.map_err(|e| {
            TallywardError::Database(format!("Failed to connect to database: {e}"))
        })?;

        tracing::info!(
            url = %redact_database_url(&config.url),
            max_connections = config.max_connections,
            "Database connected"
        );

        if config.auto_migrate {
            super::migration::run_migrations(&db).await?;
        }

        Ok(Self::new(db))
    }

    /// Get a reference to the underlying database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Ping the database to check connection health.
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| TallywardError::Database(format!("Database ping failed: {e}")))
    }

    /// Insert or update a catalog plan.
    ///
    /// The plan catalog has no write path in the request handlers; this
    /// is for seeding and operational updates.
    pub async fn upsert_plan(&self, plan: &StoredPlan) -> Result<()> {
        tracing::debug!(plan_id = %plan.id, "upserting plan");

        let model = plans::ActiveModel {
            id: Set(plan.id.clone()),
            name: Set(plan.name.clone()),
            audience: Set(plan.audience.as_str().to_string()),
            monthly_price_id: Set(plan.monthly_price_id.clone()),
            yearly_price_id: Set(plan.yearly_price_id.clone()),
            monthly_price_cents: Set(plan.monthly_price_cents),
            yearly_price_cents: Set(plan.yearly_price_cents),
            currency: Set(plan.currency.clone()),
            features: Set(plan.features.clone()),
            limits: Set(plan.limits.clone()),
            active: Set(plan.active),
        };

        plans::Entity::insert(model)
            .on_conflict(
                OnConflict::column(plans::Column::Id)
                    .update_columns([
                        plans::Column::Name,
                        plans::Column::Audience,
                        plans::Column::MonthlyPriceId,
                        plans::Column::YearlyPriceId,
                        plans::Column::MonthlyPriceCents,
                        plans::Column::YearlyPriceCents,
                        plans::Column::Currency,
                        plans::Column::Features,
                        plans::Column::Limits,
                        plans::Column::Active,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        tracing::debug!(user_id = %user_id, "fetching account by id");

        let account = accounts::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        account.map(model_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        tracing::debug!("fetching account by email");

        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        account.map(model_to_user).transpose()
    }
}

#[async_trait]
impl TenantStore for SeaOrmStore {
    async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>> {
        tracing::debug!(tenant_id = %tenant_id, "fetching tenant");

        let tenant = tenants::Entity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        tenant.map(model_to_tenant).transpose()
    }

    async fn find_client(&self, tenant_id: &str) -> Result<Option<ClientTenant>> {
        tracing::debug!(tenant_id = %tenant_id, "fetching client tenant");

        let tenant = tenants::Entity::find_by_id(tenant_id)
            .filter(tenants::Column::Kind.eq(TenantKind::Client.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        tenant.map(model_to_client).transpose()
    }

    async fn fiscal_id_exists(&self, fiscal_id: &str) -> Result<bool> {
        let count = tenants::Entity::find()
            .filter(tenants::Column::FiscalId.eq(fiscal_id))
            .count(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    async fn clients_of(&self, filter: &TenantFilter) -> Result<Vec<ClientTenant>> {
        tracing::debug!(tenant_id = %filter.tenant_id(), "listing managed clients");

        let rows = tenants::Entity::find()
            .filter(tenants::Column::Kind.eq(TenantKind::Client.as_str()))
            .filter(tenants::Column::AccountantTenantId.eq(filter.tenant_id()))
            .order_by_asc(tenants::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        rows.into_iter().map(model_to_client).collect()
    }
}

#[async_trait]
impl PlanStore for SeaOrmStore {
    async fn find_plan(&self, plan_id: &str) -> Result<Option<StoredPlan>> {
        tracing::debug!(plan_id = %plan_id, "fetching plan");

        let plan = plans::Entity::find_by_id(plan_id)
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        plan.map(model_to_plan).transpose()
    }

    async fn list_active(&self, audience: TenantKind) -> Result<Vec<StoredPlan>> {
        tracing::debug!(audience = %audience, "listing active plans");

        let rows = plans::Entity::find()
            .filter(plans::Column::Active.eq(true))
            .filter(plans::Column::Audience.eq(audience.as_str()))
            .order_by_asc(plans::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        rows.into_iter().map(model_to_plan).collect()
    }
}

#[async_trait]
impl SubscriptionStore for SeaOrmStore {
    async fn find_for_tenant(&self, filter: &TenantFilter) -> Result<Option<Subscription>> {
        tracing::debug!(tenant_id = %filter.tenant_id(), "fetching subscription for tenant");

        let row = subscriptions::Entity::find()
            .filter(subscriptions::Column::TenantId.eq(filter.tenant_id()))
            .order_by_desc(subscriptions::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        row.map(model_to_subscription).transpose()
    }

    async fn find_by_provider_ref(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>> {
        let row = subscriptions::Entity::find()
            .filter(subscriptions::Column::ProviderSubscriptionId.eq(provider_subscription_id))
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        row.map(model_to_subscription).transpose()
    }

    async fn update_status(
        &self,
        provider_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<chrono::DateTime<Utc>>,
    ) -> Result<bool> {
        tracing::debug!(
            provider_subscription_id = %provider_subscription_id,
            status = %status,
            "syncing subscription status"
        );

        let mut update = subscriptions::Entity::update_many()
            .col_expr(subscriptions::Column::Status, Expr::value(status.as_str()))
            .filter(subscriptions::Column::ProviderSubscriptionId.eq(provider_subscription_id));
        if let Some(end) = current_period_end {
            update = update.col_expr(
                subscriptions::Column::CurrentPeriodEnd,
                Expr::value(end.fixed_offset()),
            );
        }

        let result = update
            .exec(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl ProvisioningStore for SeaOrmStore {
    async fn is_event_processed(&self, event_id: &str) -> Result<bool> {
        let event = processed_events::Entity::find_by_id(event_id)
            .one(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        Ok(event.is_some())
    }

    async fn mark_event_processed(&self, event_id: &str) -> Result<()> {
        tracing::debug!(event_id = %event_id, "marking event as processed");

        let event = processed_events::ActiveModel {
            event_id: Set(event_id.to_string()),
            processed_at: Set(Utc::now().fixed_offset()),
        };

        // INSERT ... ON CONFLICT DO NOTHING keeps this idempotent without
        // matching on error strings.
        processed_events::Entity::insert(event)
            .on_conflict(
                OnConflict::column(processed_events::Column::EventId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        Ok(())
    }

    async fn provision_account(
        &self,
        event_id: &str,
        account: NewAccount,
    ) -> Result<ProvisionOutcome> {
        tracing::debug!(event_id = %event_id, "provisioning account graph");

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        // Claim the event first; the primary key arbitrates concurrent
        // deliveries of the same event.
        let claim = processed_events::Entity::insert(processed_events::ActiveModel {
            event_id: Set(event_id.to_string()),
            processed_at: Set(Utc::now().fixed_offset()),
        })
        .on_conflict(
            OnConflict::column(processed_events::Column::EventId)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await
        .map_err(|e| TallywardError::Database(e.to_string()))?;

        if matches!(claim, TryInsertResult::Conflicted) {
            txn.rollback()
                .await
                .map_err(|e| TallywardError::Database(e.to_string()))?;
            return Ok(ProvisionOutcome::AlreadyProcessed);
        }

        // Uniqueness re-checks inside the transaction. A conflict rolls
        // the claim back untouched; the caller decides whether the event
        // is a terminal duplicate.
        let email_taken = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(account.user.email.as_str()))
            .one(&txn)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?
            .is_some();
        if email_taken {
            txn.rollback()
                .await
                .map_err(|e| TallywardError::Database(e.to_string()))?;
            return Ok(ProvisionOutcome::DuplicateEmail);
        }

        let fiscal_taken = tenants::Entity::find()
            .filter(tenants::Column::FiscalId.eq(account.tenant.fiscal_id()))
            .one(&txn)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?
            .is_some();
        if fiscal_taken {
            txn.rollback()
                .await
                .map_err(|e| TallywardError::Database(e.to_string()))?;
            return Ok(ProvisionOutcome::DuplicateFiscalId);
        }

        accounts::Entity::insert(user_to_active_model(&account.user))
            .exec(&txn)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        tenants::Entity::insert(tenant_to_active_model(&account.tenant)?)
            .exec(&txn)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        subscriptions::Entity::insert(subscription_to_active_model(&account.subscription))
            .exec(&txn)
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| TallywardError::Database(e.to_string()))?;

        tracing::info!(
            user_id = %account.user.id,
            tenant_id = %account.tenant.id(),
            "account graph provisioned atomically"
        );
        Ok(ProvisionOutcome::Created)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::ClientModules;
    use chrono::TimeZone;

    fn account_model(role: &str) -> accounts::Model {
        accounts::Model {
            id: "user-1".to_string(),
            email: "ana@escritoriofreitas.com.br".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: role.to_string(),
            accountant_tenant_id: Some("tenant-1".to_string()),
            client_tenant_id: None,
            active: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap().fixed_offset(),
        }
    }

    fn tenant_model(kind: &str, modules: Option<serde_json::Value>) -> tenants::Model {
        tenants::Model {
            id: "tenant-1".to_string(),
            kind: kind.to_string(),
            owner_user_id: "user-1".to_string(),
            name: "Escritório Freitas".to_string(),
            registration_number: Some("CRC-1234".to_string()),
            fiscal_id: "11222333000181".to_string(),
            accountant_tenant_id: None,
            modules,
            active: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap().fixed_offset(),
        }
    }

    #[test]
    fn test_model_to_user() {
        let user = model_to_user(account_model("accountant")).unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.role, Role::Accountant);
        assert_eq!(user.accountant_tenant_id.as_deref(), Some("tenant-1"));
        assert!(user.client_tenant_id.is_none());
        assert_eq!(user.created_at.timestamp(), 1748779200);
    }

    #[test]
    fn test_model_to_user_rejects_unknown_role() {
        let err = model_to_user(account_model("superuser")).unwrap_err();
        assert!(matches!(err, TallywardError::Database(_)));
    }

    #[test]
    fn test_model_to_tenant_accountant() {
        let tenant = model_to_tenant(tenant_model("accountant", None)).unwrap();
        let firm = tenant.as_accountant().unwrap();
        assert_eq!(firm.company_name, "Escritório Freitas");
        assert_eq!(firm.registration_number, "CRC-1234");
    }

    #[test]
    fn test_model_to_tenant_client_reads_modules() {
        let modules = serde_json::json!({"financial": true, "documents": false});
        let tenant = model_to_tenant(tenant_model("client", Some(modules))).unwrap();
        let client = tenant.as_client().unwrap();
        assert_eq!(client.display_name, "Escritório Freitas");
        assert!(client.modules.financial);
        assert!(!client.modules.documents);
    }

    #[test]
    fn test_model_to_tenant_client_defaults_missing_modules() {
        let tenant = model_to_tenant(tenant_model("client", None)).unwrap();
        assert_eq!(tenant.as_client().unwrap().modules, ClientModules::default());
    }

    #[test]
    fn test_model_to_tenant_rejects_unknown_kind() {
        let err = model_to_tenant(tenant_model("cooperative", None)).unwrap_err();
        assert!(matches!(err, TallywardError::Database(_)));
    }

    #[test]
    fn test_client_modules_survive_active_model_round_trip() {
        let client = Tenant::Client(ClientTenant {
            id: "tenant-2".to_string(),
            owner_user_id: "user-2".to_string(),
            display_name: "Bruno Lima".to_string(),
            fiscal_id: "39053344705".to_string(),
            accountant_tenant_id: Some("tenant-1".to_string()),
            modules: ClientModules {
                financial: true,
                documents: true,
            },
            active: true,
            created_at: Utc::now(),
        });

        let active = tenant_to_active_model(&client).unwrap();
        let Set(Some(json)) = active.modules else {
            panic!("modules not set");
        };
        let back: ClientModules = serde_json::from_value(json).unwrap();
        assert!(back.financial);
        assert!(back.documents);
    }

    #[test]
    fn test_model_to_plan_parses_audience() {
        let plan = model_to_plan(plans::Model {
            id: "contador-pro".to_string(),
            name: "Contador Pro".to_string(),
            audience: "accountant".to_string(),
            monthly_price_id: Some("price_pro_monthly".to_string()),
            yearly_price_id: None,
            monthly_price_cents: Some(14900),
            yearly_price_cents: None,
            currency: "brl".to_string(),
            features: serde_json::json!({"reports": true}),
            limits: serde_json::json!({"clients": 50}),
            active: true,
        })
        .unwrap();
        assert_eq!(plan.audience, TenantKind::Accountant);
        assert!(plan.has_feature("reports"));
        assert_eq!(plan.limit("clients"), Some(50));

        let err = model_to_plan(plans::Model {
            id: "weird".to_string(),
            name: "Weird".to_string(),
            audience: "everyone".to_string(),
            monthly_price_id: None,
            yearly_price_id: None,
            monthly_price_cents: None,
            yearly_price_cents: None,
            currency: "brl".to_string(),
            features: serde_json::json!({}),
            limits: serde_json::json!({}),
            active: true,
        })
        .unwrap_err();
        assert!(matches!(err, TallywardError::Database(_)));
    }

    #[test]
    fn test_model_to_subscription_maps_status_and_period() {
        let end = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let subscription = model_to_subscription(subscriptions::Model {
            id: "sub-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            plan_id: "contador-pro".to_string(),
            interval: "monthly".to_string(),
            status: "past_due".to_string(),
            provider_subscription_id: "sub_prov_1".to_string(),
            current_period_end: Some(end.fixed_offset()),
            created_at: Utc::now().fixed_offset(),
        })
        .unwrap();
        assert_eq!(subscription.interval, BillingInterval::Monthly);
        assert_eq!(subscription.status, SubscriptionStatus::PastDue);
        assert_eq!(subscription.current_period_end, Some(end));
    }

    #[test]
    fn test_unknown_interval_is_rejected() {
        let err = model_to_subscription(subscriptions::Model {
            id: "sub-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            plan_id: "contador-pro".to_string(),
            interval: "weekly".to_string(),
            status: "active".to_string(),
            provider_subscription_id: "sub_prov_1".to_string(),
            current_period_end: None,
            created_at: Utc::now().fixed_offset(),
        })
        .unwrap_err();
        assert!(matches!(err, TallywardError::Database(_)));
    }
}
