//! Schema migrations.
//!
//! One migrator owns the whole schema. Run it explicitly with
//! [`run_migrations`] or let [`SeaOrmStore::connect`] do it when
//! `auto_migrate` is set in the config.
//!
//! [`SeaOrmStore::connect`]: crate::database::SeaOrmStore::connect

use crate::error::{Result, TallywardError};
use sea_orm_migration::MigratorTrait;
use sea_orm_migration::prelude::*;

/// All migrations, oldest first.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250601_000001_create_core_tables::Migration)]
    }
}

/// Run pending migrations.
pub async fn run_migrations(db: &sea_orm::DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| TallywardError::Database(format!("Migration failed: {e}")))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

mod m20250601_000001_create_core_tables {
    use sea_orm_migration::prelude::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Accounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Accounts::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Accounts::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Accounts::Role).string().not_null())
                        .col(ColumnDef::new(Accounts::AccountantTenantId).string().null())
                        .col(ColumnDef::new(Accounts::ClientTenantId).string().null())
                        .col(ColumnDef::new(Accounts::Active).boolean().not_null())
                        .col(
                            ColumnDef::new(Accounts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Tenants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tenants::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Tenants::Kind).string().not_null())
                        .col(ColumnDef::new(Tenants::OwnerUserId).string().not_null())
                        .col(ColumnDef::new(Tenants::Name).string().not_null())
                        .col(ColumnDef::new(Tenants::RegistrationNumber).string().null())
                        .col(
                            ColumnDef::new(Tenants::FiscalId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Tenants::AccountantTenantId).string().null())
                        .col(ColumnDef::new(Tenants::Modules).json_binary().null())
                        .col(ColumnDef::new(Tenants::Active).boolean().not_null())
                        .col(
                            ColumnDef::new(Tenants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Plans::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Plans::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Plans::Name).string().not_null())
                        .col(ColumnDef::new(Plans::Audience).string().not_null())
                        .col(ColumnDef::new(Plans::MonthlyPriceId).string().null())
                        .col(ColumnDef::new(Plans::YearlyPriceId).string().null())
                        .col(ColumnDef::new(Plans::MonthlyPriceCents).big_integer().null())
                        .col(ColumnDef::new(Plans::YearlyPriceCents).big_integer().null())
                        .col(ColumnDef::new(Plans::Currency).string().not_null())
                        .col(ColumnDef::new(Plans::Features).json_binary().not_null())
                        .col(ColumnDef::new(Plans::Limits).json_binary().not_null())
                        .col(ColumnDef::new(Plans::Active).boolean().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Subscriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Subscriptions::Id)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Subscriptions::TenantId).string().not_null())
                        .col(ColumnDef::new(Subscriptions::PlanId).string().not_null())
                        .col(ColumnDef::new(Subscriptions::Interval).string().not_null())
                        .col(ColumnDef::new(Subscriptions::Status).string().not_null())
                        .col(
                            ColumnDef::new(Subscriptions::ProviderSubscriptionId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CurrentPeriodEnd)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Subscriptions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProcessedEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProcessedEvents::EventId)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ProcessedEvents::ProcessedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Roster listings filter client tenants by their managing firm.
            manager
                .create_index(
                    Index::create()
                        .name("idx-tenants-accountant-tenant-id")
                        .table(Tenants::Table)
                        .col(Tenants::AccountantTenantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-subscriptions-tenant-id")
                        .table(Subscriptions::Table)
                        .col(Subscriptions::TenantId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProcessedEvents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Plans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tenants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Accounts::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Accounts {
        Table,
        Id,
        Email,
        PasswordHash,
        Role,
        AccountantTenantId,
        ClientTenantId,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Tenants {
        Table,
        Id,
        Kind,
        OwnerUserId,
        Name,
        RegistrationNumber,
        FiscalId,
        AccountantTenantId,
        Modules,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Plans {
        Table,
        Id,
        Name,
        Audience,
        MonthlyPriceId,
        YearlyPriceId,
        MonthlyPriceCents,
        YearlyPriceCents,
        Currency,
        Features,
        Limits,
        Active,
    }

    #[derive(DeriveIden)]
    enum Subscriptions {
        Table,
        Id,
        TenantId,
        PlanId,
        Interval,
        Status,
        ProviderSubscriptionId,
        CurrentPeriodEnd,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ProcessedEvents {
        Table,
        EventId,
        ProcessedAt,
    }
}
