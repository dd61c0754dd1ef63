//! Menu item repository
//!
//! Local catalog access. Vendor-sourced rows are keyed by `(tenant_id, source,
//! toast_item_id)` and are only ever soft-removed.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::menu_item::{self, Entity as MenuItem, SOURCE_TOAST};

/// Field values written on insert or update of a vendor-sourced item.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastItemFields {
    pub toast_item_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: f64,
    pub available: bool,
    pub toast_metadata: Option<JsonValue>,
}

#[derive(Debug, Clone)]
pub struct MenuItemRepository {
    pub db: Arc<DatabaseConnection>,
}

impl MenuItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All vendor-sourced items for a tenant, including soft-removed ones.
    pub async fn list_toast_items(&self, tenant_id: &Uuid) -> Result<Vec<menu_item::Model>> {
        Ok(MenuItem::find()
            .filter(menu_item::Column::TenantId.eq(*tenant_id))
            .filter(menu_item::Column::Source.eq(SOURCE_TOAST))
            .order_by_asc(menu_item::Column::CreatedAt)
            .order_by_asc(menu_item::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Vendor-sourced items that may still be referenced by new orders.
    pub async fn list_orderable_toast_items(
        &self,
        tenant_id: &Uuid,
    ) -> Result<Vec<menu_item::Model>> {
        Ok(MenuItem::find()
            .filter(menu_item::Column::TenantId.eq(*tenant_id))
            .filter(menu_item::Column::Source.eq(SOURCE_TOAST))
            .filter(menu_item::Column::RemovedFromToast.eq(false))
            .filter(menu_item::Column::ToastItemId.is_not_null())
            .order_by_asc(menu_item::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn insert_toast_item(&self, tenant_id: &Uuid, fields: ToastItemFields) -> Result<Uuid> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let active = menu_item::ActiveModel {
            id: Set(id),
            tenant_id: Set(*tenant_id),
            source: Set(SOURCE_TOAST.to_string()),
            toast_item_id: Set(Some(fields.toast_item_id)),
            name: Set(fields.name),
            description: Set(fields.description),
            category: Set(fields.category),
            price: Set(fields.price),
            available: Set(fields.available),
            removed_from_toast: Set(false),
            toast_metadata: Set(fields.toast_metadata),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        MenuItem::insert(active).exec(&*self.db).await?;

        Ok(id)
    }

    /// Overwrites the vendor fields; a reappearing item loses its removed marker.
    pub async fn update_toast_item(
        &self,
        existing: menu_item::Model,
        fields: ToastItemFields,
    ) -> Result<menu_item::Model> {
        let mut active: menu_item::ActiveModel = existing.into();
        active.name = Set(fields.name);
        active.description = Set(fields.description);
        active.category = Set(fields.category);
        active.price = Set(fields.price);
        active.available = Set(fields.available);
        active.removed_from_toast = Set(false);
        active.toast_metadata = Set(fields.toast_metadata);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn mark_removed(&self, existing: menu_item::Model) -> Result<menu_item::Model> {
        let mut active: menu_item::ActiveModel = existing.into();
        active.available = Set(false);
        active.removed_from_toast = Set(true);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }
}
