//! Database migrations for the Toast gateway.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_11_10_090000_create_integrations;
mod m2025_11_10_090100_create_menu_items;
mod m2025_11_10_090200_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_11_10_090000_create_integrations::Migration),
            Box::new(m2025_11_10_090100_create_menu_items::Migration),
            Box::new(m2025_11_10_090200_create_orders::Migration),
        ]
    }
}
