//! Migration to create the orders table.
//!
//! Locally captured orders (phone agent, web, manual) with the POS push
//! outcome merged into the same row.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Orders::Channel).text().not_null())
                    .col(ColumnDef::new(Orders::CustomerName).text().null())
                    .col(ColumnDef::new(Orders::CustomerPhone).text().null())
                    .col(ColumnDef::new(Orders::CustomerEmail).text().null())
                    .col(
                        ColumnDef::new(Orders::OrderType)
                            .text()
                            .not_null()
                            .default("pickup"),
                    )
                    .col(
                        ColumnDef::new(Orders::RequestedPickupTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::Items).json_binary().not_null())
                    .col(
                        ColumnDef::new(Orders::Total)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Orders::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::PosOrderId).text().null())
                    .col(ColumnDef::new(Orders::PosStatus).text().null())
                    .col(ColumnDef::new(Orders::PosError).json_binary().null())
                    .col(ColumnDef::new(Orders::PosOrderNumber).text().null())
                    .col(
                        ColumnDef::new(Orders::PosPushedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
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
                    .name("idx_orders_tenant_id")
                    .table(Orders::Table)
                    .col(Orders::TenantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_orders_tenant_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    TenantId,
    Channel,
    CustomerName,
    CustomerPhone,
    CustomerEmail,
    OrderType,
    RequestedPickupTime,
    Items,
    Total,
    Status,
    PosOrderId,
    PosStatus,
    PosError,
    PosOrderNumber,
    PosPushedAt,
    CreatedAt,
    UpdatedAt,
}
