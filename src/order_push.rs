//! # Order Push
//!
//! Turns a locally captured order into a Toast order and submits it. Line
//! items are resolved to vendor guids best-effort: by local menu item id
//! first, then by case-folded name. Lines that cannot be resolved are dropped
//! and reported, the rest are still sent. The outcome is merged into the local
//! order and replaces any previous attempt.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ToastConfig;
use crate::models::menu_item;
use crate::models::order::{self, OrderLineItem};
use crate::repositories::order::PushRecord;
use crate::repositories::{IntegrationRepository, MenuItemRepository, OrderRepository};
use crate::toast::types::{
    VendorCheck, VendorCustomer, VendorItemRef, VendorOrderPayload, VendorOrderType,
    VendorSelection,
};
use crate::toast::{ToastClient, ToastError};

/// First name sent when the order carries no customer name.
pub const GUEST_FIRST_NAME: &str = "Guest";

const ORDER_NUMBER_LEN: usize = 6;

/// Outcome of a push attempt, as persisted on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPushOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_order_number: Option<String>,
    /// Names of line items left out because no vendor item matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Order-level settings stamped on every payload.
#[derive(Debug, Clone)]
pub struct OrderPushSettings {
    pub source: String,
    pub default_fulfillment_minutes: u32,
}

impl From<&ToastConfig> for OrderPushSettings {
    fn from(config: &ToastConfig) -> Self {
        Self {
            source: config.order_source.clone(),
            default_fulfillment_minutes: config.default_fulfillment_minutes,
        }
    }
}

/// Maps order lines to vendor item guids using the tenant's synced catalog.
///
/// Names shared by more than one vendor item are left out of the name
/// fallback; such lines only resolve by local id.
#[derive(Debug, Default)]
pub struct ItemResolver {
    by_local_id: HashMap<Uuid, String>,
    by_name: HashMap<String, String>,
}

impl ItemResolver {
    pub fn new(catalog: &[menu_item::Model]) -> Self {
        let mut by_local_id = HashMap::new();
        let mut candidates: HashMap<String, Vec<String>> = HashMap::new();

        for item in catalog.iter().filter(|item| !item.removed_from_toast) {
            let Some(guid) = item.toast_item_id.as_ref() else {
                continue;
            };
            by_local_id.insert(item.id, guid.clone());
            candidates
                .entry(fold_name(&item.name))
                .or_default()
                .push(guid.clone());
        }

        let by_name = candidates
            .into_iter()
            .filter_map(|(name, guids)| match guids.as_slice() {
                [only] => Some((name, only.clone())),
                _ => {
                    debug!(name = %name, matches = guids.len(), "Ambiguous menu item name");
                    None
                }
            })
            .collect();

        Self {
            by_local_id,
            by_name,
        }
    }

    pub fn resolve(&self, line: &OrderLineItem) -> Option<&str> {
        line.menu_item_id
            .and_then(|id| self.by_local_id.get(&id))
            .or_else(|| self.by_name.get(&fold_name(&line.name)))
            .map(String::as_str)
    }
}

fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Vendor payload plus the lines that could not be included.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub payload: VendorOrderPayload,
    pub dropped: Vec<String>,
}

/// Builds the vendor order for `order`. Pure; `now` anchors the default fulfillment time.
pub fn build_vendor_order(
    order: &order::Model,
    lines: &[OrderLineItem],
    resolver: &ItemResolver,
    settings: &OrderPushSettings,
    now: DateTime<Utc>,
) -> OrderDraft {
    let fulfillment = order
        .requested_pickup_time
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| now + Duration::minutes(i64::from(settings.default_fulfillment_minutes)));

    let mut selections = Vec::with_capacity(lines.len());
    let mut dropped = Vec::new();

    for line in lines {
        match resolver.resolve(line) {
            Some(guid) => selections.push(VendorSelection {
                item: VendorItemRef {
                    guid: guid.to_string(),
                    entity_type: "MenuItem".to_string(),
                },
                quantity: line.quantity.max(1),
                special_request: line
                    .special_instructions
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            }),
            None => dropped.push(line.name.clone()),
        }
    }

    let (first_name, last_name) = split_customer_name(order.customer_name.as_deref());

    let payload = VendorOrderPayload {
        entity_type: "Order".to_string(),
        business_date: business_date(fulfillment),
        estimated_fulfillment_date: fulfillment.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
        source: settings.source.clone(),
        order_type: if order.is_delivery() {
            VendorOrderType::Delivery
        } else {
            VendorOrderType::Takeout
        },
        checks: vec![VendorCheck {
            customer: VendorCustomer {
                first_name,
                last_name,
                phone: non_blank(order.customer_phone.as_deref()),
                email: non_blank(order.customer_email.as_deref()),
            },
            selections,
        }],
    };

    OrderDraft { payload, dropped }
}

/// First whitespace-separated token is the first name, the remainder the last name.
pub fn split_customer_name(name: Option<&str>) -> (String, Option<String>) {
    let mut parts = name.unwrap_or_default().split_whitespace();
    match parts.next() {
        Some(first) => {
            let rest = parts.collect::<Vec<_>>().join(" ");
            (first.to_string(), (!rest.is_empty()).then_some(rest))
        }
        None => (GUEST_FIRST_NAME.to_string(), None),
    }
}

/// Short human-readable order number: the last six hex digits of the order id.
pub fn pos_order_number(order_id: &Uuid) -> String {
    let simple = order_id.simple().to_string();
    simple[simple.len() - ORDER_NUMBER_LEN..].to_uppercase()
}

fn business_date(at: DateTime<Utc>) -> u32 {
    // Years before 0 cannot occur for a chrono timestamp derived from now or a stored date.
    let year = u32::try_from(at.year()).unwrap_or(0);
    year * 10_000 + at.month() * 100 + at.day()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct OrderPushGateway {
    client: ToastClient,
    orders: OrderRepository,
    menu_items: MenuItemRepository,
    integrations: IntegrationRepository,
    settings: OrderPushSettings,
}

impl OrderPushGateway {
    pub fn new(
        client: ToastClient,
        orders: OrderRepository,
        menu_items: MenuItemRepository,
        integrations: IntegrationRepository,
        settings: OrderPushSettings,
    ) -> Self {
        Self {
            client,
            orders,
            menu_items,
            integrations,
            settings,
        }
    }

    /// Pushes one order to Toast and records the outcome on it.
    ///
    /// Only a missing order or a failure to load it is returned as an error;
    /// every vendor-side problem is captured in the outcome and on the order.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id))]
    pub async fn push_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderPushOutcome, ToastError> {
        let order = self
            .orders
            .find(&tenant_id, &order_id)
            .await?
            .ok_or_else(|| ToastError::NotFound(format!("order {}", order_id)))?;

        let (record, outcome) = match self.submit(&tenant_id, &order).await {
            Ok((vendor_order_id, dropped_items)) => {
                let number = pos_order_number(&order.id);
                counter!("toast_order_push_total", "outcome" => "success").increment(1);
                info!(
                    vendor_order_id = %vendor_order_id,
                    dropped = dropped_items.len(),
                    "Order pushed to Toast"
                );
                (
                    PushRecord::Sent {
                        pos_order_id: vendor_order_id.clone(),
                        pos_order_number: number.clone(),
                    },
                    OrderPushOutcome {
                        success: true,
                        vendor_order_id: Some(vendor_order_id),
                        pos_order_number: Some(number),
                        dropped_items,
                        error: None,
                    },
                )
            }
            Err(error) => {
                counter!("toast_order_push_total", "outcome" => "failure").increment(1);
                warn!(error = %error, kind = error.kind(), "Order push to Toast failed");
                (
                    PushRecord::Failed {
                        message: error.to_string(),
                    },
                    OrderPushOutcome {
                        success: false,
                        error: Some(error.to_string()),
                        ..OrderPushOutcome::default()
                    },
                )
            }
        };

        if let Err(record_err) = self.orders.record_push(order, record).await {
            error!(error = ?record_err, "Failed to record order push outcome");
        }

        Ok(outcome)
    }

    async fn submit(
        &self,
        tenant_id: &Uuid,
        order: &order::Model,
    ) -> Result<(String, Vec<String>), ToastError> {
        let lines = order
            .line_items()
            .map_err(|e| ToastError::Unpushable(format!("malformed line items: {}", e)))?;

        let catalog = self.menu_items.list_orderable_toast_items(tenant_id).await?;
        let resolver = ItemResolver::new(&catalog);
        let draft = build_vendor_order(order, &lines, &resolver, &self.settings, Utc::now());

        for name in &draft.dropped {
            warn!(item = %name, "No Toast item matches order line, dropping it");
        }

        if draft.payload.selection_count() == 0 {
            return Err(ToastError::Unpushable(
                "no order items could be matched to Toast menu items".into(),
            ));
        }

        let created = self.client.create_order(tenant_id, &draft.payload).await?;
        let vendor_order_id = created
            .order_id()
            .ok_or_else(|| ToastError::Decode("order response carried no guid or id".into()))?;

        Ok((vendor_order_id, draft.dropped))
    }

    /// Order-creation hook. Pushes automated voice orders when the tenant has
    /// order push switched on; never fails the caller.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, order_id = %order_id))]
    pub async fn on_order_created(&self, tenant_id: Uuid, order_id: Uuid) -> Option<OrderPushOutcome> {
        let order = match self.orders.find(&tenant_id, &order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("Created order not found, skipping Toast push");
                return None;
            }
            Err(error) => {
                warn!(error = ?error, "Failed to load created order, skipping Toast push");
                return None;
            }
        };

        if !order.is_automated_voice_order() {
            debug!(channel = %order.channel, "Order channel does not auto-push");
            return None;
        }

        match self.integrations.find_toast(&tenant_id).await {
            Ok(Some(integration)) if integration.is_active() && integration.order_push_enabled => {}
            Ok(_) => {
                debug!("Toast order push not enabled for tenant");
                return None;
            }
            Err(error) => {
                warn!(error = ?error, "Failed to load Toast integration, skipping push");
                return None;
            }
        }

        match self.push_order(tenant_id, order_id).await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!(error = %error, "Automatic Toast push did not run");
                None
            }
        }
    }
}
