//! Migration to create the integrations table.
//!
//! One row per tenant and POS provider, holding encrypted vendor credentials,
//! the restaurant binding, sync settings and the last recorded failure.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Integrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Integrations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Integrations::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Integrations::Provider).text().not_null())
                    .col(
                        ColumnDef::new(Integrations::Enabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Integrations::Status)
                            .text()
                            .not_null()
                            .default("disconnected"),
                    )
                    .col(
                        ColumnDef::new(Integrations::AccessTokenCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Integrations::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Integrations::RestaurantGuid).text().null())
                    .col(ColumnDef::new(Integrations::RestaurantName).text().null())
                    .col(ColumnDef::new(Integrations::ClientId).text().null())
                    .col(
                        ColumnDef::new(Integrations::ClientSecretCiphertext)
                            .binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Integrations::MenuSyncEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Integrations::OrderPushEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Integrations::LastMenuSync)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Integrations::LastError).json_binary().null())
                    .col(
                        ColumnDef::new(Integrations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Integrations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_integrations_tenant_provider")
                    .table(Integrations::Table)
                    .col(Integrations::TenantId)
                    .col(Integrations::Provider)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Scheduled sync scans by provider + flags
        manager
            .create_index(
                Index::create()
                    .name("idx_integrations_provider_enabled")
                    .table(Integrations::Table)
                    .col(Integrations::Provider)
                    .col(Integrations::Enabled)
                    .col(Integrations::MenuSyncEnabled)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_integrations_provider_enabled")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_integrations_tenant_provider")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Integrations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Integrations {
    Table,
    Id,
    TenantId,
    Provider,
    Enabled,
    Status,
    AccessTokenCiphertext,
    TokenExpiresAt,
    RestaurantGuid,
    RestaurantName,
    ClientId,
    ClientSecretCiphertext,
    MenuSyncEnabled,
    OrderPushEnabled,
    LastMenuSync,
    LastError,
    CreatedAt,
    UpdatedAt,
}
