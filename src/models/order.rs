//! Order entity model
//!
//! Locally captured orders. The POS push outcome (`pos_*` columns) is merged
//! into the same row and overwritten on every push attempt.

use chrono::{DateTime, Utc};
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Channels served by the automated phone agent; only these auto-push.
pub const AUTOMATED_VOICE_CHANNELS: &[&str] = &["voice_agent", "ai_phone"];

/// Order entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    /// Originating channel (voice_agent|ai_phone|web|manual|...)
    pub channel: String,

    pub customer_name: Option<String>,

    pub customer_phone: Option<String>,

    pub customer_email: Option<String>,

    /// Fulfillment type (pickup|delivery)
    pub order_type: String,

    pub requested_pickup_time: Option<DateTimeWithTimeZone>,

    /// Line items as a JSON array of [`OrderLineItem`]
    #[sea_orm(column_type = "JsonBinary")]
    pub items: JsonValue,

    pub total: f64,

    pub status: String,

    pub pos_order_id: Option<String>,

    /// Push outcome (sent_to_pos|push_failed)
    pub pos_status: Option<String>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub pos_error: Option<JsonValue>,

    pub pos_order_number: Option<String>,

    pub pos_pushed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A single line of a local order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    #[serde(default, alias = "menu_item_id")]
    pub menu_item_id: Option<Uuid>,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "special_instructions")]
    pub special_instructions: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Outcome of the most recent push attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PosStatus {
    SentToPos,
    PushFailed,
}

impl PosStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosStatus::SentToPos => "sent_to_pos",
            PosStatus::PushFailed => "push_failed",
        }
    }
}

/// Error detail stored alongside a failed push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PosError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Model {
    /// Decode the stored line items; malformed entries are an error.
    pub fn line_items(&self) -> Result<Vec<OrderLineItem>, serde_json::Error> {
        serde_json::from_value(self.items.clone())
    }

    pub fn is_automated_voice_order(&self) -> bool {
        AUTOMATED_VOICE_CHANNELS.contains(&self.channel.as_str())
    }

    pub fn is_delivery(&self) -> bool {
        self.order_type.eq_ignore_ascii_case("delivery")
    }
}
