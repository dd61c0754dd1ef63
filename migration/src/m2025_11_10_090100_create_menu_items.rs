//! Migration to create the menu_items table.
//!
//! Local catalog entries per tenant. Rows sourced from the POS carry the
//! vendor item guid and are soft-removed rather than deleted.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MenuItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MenuItems::TenantId).uuid().not_null())
                    .col(
                        ColumnDef::new(MenuItems::Source)
                            .text()
                            .not_null()
                            .default("manual"),
                    )
                    .col(ColumnDef::new(MenuItems::ToastItemId).text().null())
                    .col(ColumnDef::new(MenuItems::Name).text().not_null())
                    .col(ColumnDef::new(MenuItems::Description).text().null())
                    .col(
                        ColumnDef::new(MenuItems::Category)
                            .text()
                            .not_null()
                            .default("Uncategorized"),
                    )
                    .col(
                        ColumnDef::new(MenuItems::Price)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(MenuItems::Available)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(MenuItems::RemovedFromToast)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(MenuItems::ToastMetadata).json_binary().null())
                    .col(
                        ColumnDef::new(MenuItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MenuItems::UpdatedAt)
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
                    .name("idx_menu_items_tenant_source_toast_item")
                    .table(MenuItems::Table)
                    .col(MenuItems::TenantId)
                    .col(MenuItems::Source)
                    .col(MenuItems::ToastItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_menu_items_tenant_source_toast_item")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(MenuItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MenuItems {
    Table,
    Id,
    TenantId,
    Source,
    ToastItemId,
    Name,
    Description,
    Category,
    Price,
    Available,
    RemovedFromToast,
    ToastMetadata,
    CreatedAt,
    UpdatedAt,
}
