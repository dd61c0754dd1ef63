//! # Menu Sync
//!
//! Reconciles the vendor catalog against the tenant's vendor-sourced menu
//! items. Items are matched by vendor guid: matches are updated, new guids are
//! inserted, and local items the vendor no longer returns are soft-removed.
//! Nothing is ever deleted, so historical orders keep their references.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::integration::IntegrationError;
use crate::models::menu_item;
use crate::repositories::menu_item::ToastItemFields;
use crate::repositories::{IntegrationRepository, MenuItemRepository};
use crate::toast::types::VendorItem;
use crate::toast::{ToastClient, ToastError};

/// Category used when the vendor item has no sales category.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Failure type written to `last_error` when a sync fails.
pub const MENU_SYNC_FAILED: &str = "menu_sync_failed";

/// Result of one sync run. Failures are reported here, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuSyncReport {
    pub success: bool,
    pub items_added: u32,
    pub items_updated: u32,
    pub items_removed: u32,
    /// Vendor items ignored for a missing guid/name or a repeated guid.
    pub items_skipped: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MenuSyncEngine {
    client: ToastClient,
    menu_items: MenuItemRepository,
    integrations: IntegrationRepository,
}

impl MenuSyncEngine {
    pub fn new(
        client: ToastClient,
        menu_items: MenuItemRepository,
        integrations: IntegrationRepository,
    ) -> Self {
        Self {
            client,
            menu_items,
            integrations,
        }
    }

    /// Pulls the vendor catalog and reconciles it into the local menu.
    ///
    /// On success `last_menu_sync` is stamped and `last_error` cleared. On any
    /// failure `last_error` records `menu_sync_failed` and the report carries
    /// the message; counts reflect the writes made before the failure.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn sync_menu_from_vendor(&self, tenant_id: Uuid) -> MenuSyncReport {
        let started = Instant::now();
        let mut report = MenuSyncReport::default();

        let outcome = self.reconcile(&tenant_id, &mut report).await;
        histogram!("toast_menu_sync_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

        match outcome {
            Ok(()) => {
                report.success = true;
                counter!("toast_menu_sync_total", "outcome" => "success").increment(1);
                info!(
                    added = report.items_added,
                    updated = report.items_updated,
                    removed = report.items_removed,
                    skipped = report.items_skipped,
                    "Toast menu sync completed"
                );
            }
            Err(error) => {
                counter!("toast_menu_sync_total", "outcome" => "failure").increment(1);
                warn!(error = %error, kind = error.kind(), "Toast menu sync failed");

                let trail = IntegrationError::new(MENU_SYNC_FAILED, error.to_string());
                if let Err(record_err) = self.integrations.record_error(&tenant_id, &trail).await {
                    warn!(error = ?record_err, "Failed to record menu sync failure");
                }

                report.success = false;
                report.error = Some(error.to_string());
            }
        }

        report
    }

    async fn reconcile(
        &self,
        tenant_id: &Uuid,
        report: &mut MenuSyncReport,
    ) -> Result<(), ToastError> {
        let vendor_items = self.client.fetch_menu_items(tenant_id).await?;

        let mut unseen: HashMap<String, menu_item::Model> = self
            .menu_items
            .list_toast_items(tenant_id)
            .await?
            .into_iter()
            .filter_map(|item| item.toast_item_id.clone().map(|guid| (guid, item)))
            .collect();
        let mut seen = HashSet::new();

        for vendor_item in &vendor_items {
            let Some(fields) = toast_item_fields(vendor_item) else {
                report.items_skipped += 1;
                warn!(
                    guid = ?vendor_item.guid,
                    name = ?vendor_item.name,
                    "Skipping Toast item without guid or name"
                );
                continue;
            };

            if !seen.insert(fields.toast_item_id.clone()) {
                report.items_skipped += 1;
                warn!(guid = %fields.toast_item_id, "Skipping repeated Toast item guid");
                continue;
            }

            match unseen.remove(&fields.toast_item_id) {
                Some(existing) => {
                    self.menu_items.update_toast_item(existing, fields).await?;
                    report.items_updated += 1;
                }
                None => {
                    self.menu_items.insert_toast_item(tenant_id, fields).await?;
                    report.items_added += 1;
                }
            }
        }

        for (guid, stale) in unseen {
            if stale.removed_from_toast {
                continue;
            }
            self.menu_items.mark_removed(stale).await?;
            report.items_removed += 1;
            info!(guid = %guid, "Toast item no longer listed, marked removed");
        }

        self.integrations
            .record_menu_sync(tenant_id, Utc::now())
            .await?;

        Ok(())
    }
}

/// Local field values for a vendor item, or `None` when guid or name is blank.
pub fn toast_item_fields(item: &VendorItem) -> Option<ToastItemFields> {
    let guid = item.guid.as_deref().map(str::trim).filter(|g| !g.is_empty())?;
    let name = item.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;

    let category = item
        .sales_category
        .as_ref()
        .and_then(|category| category.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);

    let metadata = json!({
        "guid": guid,
        "plu": item.plu,
        "sku": item.sku,
        "multiLocationId": item.multi_location_id,
        "salesCategoryGuid": item.sales_category.as_ref().and_then(|c| c.guid.clone()),
        "visibility": item.visibility,
    });

    Some(ToastItemFields {
        toast_item_id: guid.to_string(),
        name: name.to_string(),
        description: item
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        category: category.to_string(),
        price: item.price.filter(|p| p.is_finite()).unwrap_or(0.0),
        available: !item.is_hidden(),
        toast_metadata: Some(metadata),
    })
}
