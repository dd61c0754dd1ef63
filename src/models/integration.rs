//! Integration entity model
//!
//! This module contains the SeaORM entity model for the integrations table,
//! which stores one POS integration record per tenant and provider.

use chrono::{DateTime, Utc};
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// Provider name under which Toast integrations are stored.
pub const TOAST_PROVIDER: &str = "toast";

/// Integration entity representing a tenant's POS credentials and sync settings
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "integrations")]
pub struct Model {
    /// Unique identifier for the integration (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant that owns this integration
    pub tenant_id: Uuid,

    /// Provider name (unique per tenant)
    pub provider: String,

    /// Whether the tenant has switched the integration on
    pub enabled: bool,

    /// Connection status (connected|disconnected)
    pub status: String,

    /// Encrypted vendor access token
    pub access_token_ciphertext: Option<Vec<u8>>,

    /// Expiry reported by the vendor on the last token exchange
    pub token_expires_at: Option<DateTimeWithTimeZone>,

    /// Vendor-side restaurant identifier
    pub restaurant_guid: Option<String>,

    /// Restaurant display name captured at connect time
    pub restaurant_name: Option<String>,

    /// Tenant-scoped vendor client id
    pub client_id: Option<String>,

    /// Encrypted tenant-scoped vendor client secret
    pub client_secret_ciphertext: Option<Vec<u8>>,

    /// Scheduled menu sync toggle
    pub menu_sync_enabled: bool,

    /// Automatic order push toggle
    pub order_push_enabled: bool,

    /// Completion time of the last successful menu sync
    pub last_menu_sync: Option<DateTimeWithTimeZone>,

    /// Last recorded failure (`{type, message, timestamp}`)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub last_error: Option<JsonValue>,

    /// Timestamp when the integration was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the integration was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Connection status of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Connected => "connected",
            IntegrationStatus::Disconnected => "disconnected",
        }
    }

    /// Parse a stored status; anything unknown is treated as disconnected.
    pub fn parse(value: &str) -> Self {
        match value {
            "connected" => IntegrationStatus::Connected,
            _ => IntegrationStatus::Disconnected,
        }
    }
}

/// Failure trail persisted on the integration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IntegrationError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl IntegrationError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl Model {
    pub fn status(&self) -> IntegrationStatus {
        IntegrationStatus::parse(&self.status)
    }

    /// Vendor calls may only be attempted when this holds.
    pub fn is_active(&self) -> bool {
        self.enabled && self.status() == IntegrationStatus::Connected
    }

    pub fn last_error(&self) -> Option<IntegrationError> {
        self.last_error
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
