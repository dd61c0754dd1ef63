//! Typed Toast payloads at the HTTP boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Visibility marker that hides an item from ordering.
pub const VISIBILITY_HIDDEN: &str = "HIDDEN";

/// Login body for the machine-client credential exchange.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub user_access_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Login response; Toast nests the token under `token`, some gateways return it flat.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    token: Option<TokenBody>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Access token issued by the vendor.
#[derive(Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl LoginResponse {
    pub fn into_token(self, issued_at: DateTime<Utc>) -> Option<IssuedToken> {
        let (access_token, expires_in) = match self.token {
            Some(TokenBody {
                access_token: Some(token),
                expires_in,
            }) => (token, expires_in),
            _ => (self.access_token?, self.expires_in),
        };

        if access_token.is_empty() {
            return None;
        }

        Some(IssuedToken {
            access_token,
            expires_at: expires_in
                .filter(|seconds| *seconds > 0)
                .map(|seconds| issued_at + Duration::seconds(seconds)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesCategory {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Either a single state (`"HIDDEN"`) or a list of channels the item is shown on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Visibility {
    State(String),
    Channels(Vec<String>),
}

impl Visibility {
    pub fn is_hidden(&self) -> bool {
        match self {
            Visibility::State(state) => state.eq_ignore_ascii_case(VISIBILITY_HIDDEN),
            Visibility::Channels(channels) => channels
                .iter()
                .any(|channel| channel.eq_ignore_ascii_case(VISIBILITY_HIDDEN)),
        }
    }
}

/// Menu item as returned by the vendor catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorItem {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub sales_category: Option<SalesCategory>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub plu: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub multi_location_id: Option<String>,
}

impl VendorItem {
    pub fn is_hidden(&self) -> bool {
        self.visibility.as_ref().is_some_and(Visibility::is_hidden)
    }
}

/// Items listing; accepts `{items: [...]}` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MenuItemsResponse {
    Wrapped {
        #[serde(default)]
        items: Vec<VendorItem>,
    },
    Bare(Vec<VendorItem>),
}

impl MenuItemsResponse {
    pub fn into_items(self) -> Vec<VendorItem> {
        match self {
            MenuItemsResponse::Wrapped { items } => items,
            MenuItemsResponse::Bare(items) => items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorOrderType {
    Delivery,
    Takeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorCustomer {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorItemRef {
    pub guid: String,
    pub entity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorSelection {
    pub item: VendorItemRef,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorCheck {
    pub customer: VendorCustomer,
    pub selections: Vec<VendorSelection>,
}

/// Order payload submitted to the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorOrderPayload {
    pub entity_type: String,
    /// `yyyymmdd`
    pub business_date: u32,
    pub estimated_fulfillment_date: String,
    pub source: String,
    pub order_type: VendorOrderType,
    pub checks: Vec<VendorCheck>,
}

impl VendorOrderPayload {
    pub fn selection_count(&self) -> usize {
        self.checks.iter().map(|check| check.selections.len()).sum()
    }
}

/// Vendor acknowledgement of a created order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub id: Option<JsonValue>,
}

impl CreatedOrder {
    /// Prefers `guid`, falling back to `id` (string or number).
    pub fn order_id(&self) -> Option<String> {
        if let Some(guid) = self.guid.as_deref().filter(|g| !g.is_empty()) {
            return Some(guid.to_string());
        }
        match self.id.as_ref()? {
            JsonValue::String(id) if !id.is_empty() => Some(id.clone()),
            JsonValue::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Display name from a restaurant details document (`general.name`, then `name`).
pub fn restaurant_name(details: &JsonValue) -> Option<String> {
    details
        .pointer("/general/name")
        .or_else(|| details.get("name"))
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
