//! Menu item entity model
//!
//! Local catalog entries per tenant. Items pulled from the POS are tagged
//! with `source = "toast"` and keyed by the vendor item guid.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Source tag for items mirrored from Toast.
pub const SOURCE_TOAST: &str = "toast";

/// Source tag for items entered by the restaurant directly.
pub const SOURCE_MANUAL: &str = "manual";

/// Menu item entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Uuid,

    /// Origin of the item (toast|manual)
    pub source: String,

    /// Vendor item guid, unique within tenant + source
    pub toast_item_id: Option<String>,

    pub name: String,

    pub description: Option<String>,

    pub category: String,

    pub price: f64,

    pub available: bool,

    /// Soft-delete marker set when the vendor stops returning the item
    pub removed_from_toast: bool,

    /// Opaque vendor fields kept for traceability
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub toast_metadata: Option<JsonValue>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
