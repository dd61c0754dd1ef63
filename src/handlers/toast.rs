//! # Toast Integration Handlers
//!
//! Tenant-scoped endpoints for the Toast integration: status, connect and
//! disconnect, sync settings, manual menu sync and vendor pass-through
//! diagnostics.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::{ApiError, validation_error};
use crate::menu_sync::MenuSyncReport;
use crate::models::integration::{self, IntegrationError, IntegrationStatus};
use crate::repositories::integration::{IntegrationCredentials, SyncSettingsUpdate};
use crate::server::AppState;
use crate::toast::ToastError;

/// Integration state as exposed to operators. Never carries secrets.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationInfo {
    #[schema(value_type = String)]
    pub tenant_id: Uuid,
    pub provider: String,
    pub enabled: bool,
    pub status: IntegrationStatus,
    pub restaurant_guid: Option<String>,
    pub restaurant_name: Option<String>,
    pub client_id: Option<String>,
    /// Whether an encrypted access token is stored
    pub has_access_token: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub menu_sync_enabled: bool,
    pub order_push_enabled: bool,
    pub last_menu_sync: Option<DateTime<Utc>>,
    pub last_error: Option<IntegrationError>,
}

impl From<integration::Model> for IntegrationInfo {
    fn from(model: integration::Model) -> Self {
        Self {
            tenant_id: model.tenant_id,
            status: model.status(),
            last_error: model.last_error(),
            provider: model.provider,
            enabled: model.enabled,
            restaurant_guid: model.restaurant_guid,
            restaurant_name: model.restaurant_name,
            client_id: model.client_id,
            has_access_token: model.access_token_ciphertext.is_some(),
            token_expires_at: model.token_expires_at.map(|at| at.with_timezone(&Utc)),
            menu_sync_enabled: model.menu_sync_enabled,
            order_push_enabled: model.order_push_enabled,
            last_menu_sync: model.last_menu_sync.map(|at| at.with_timezone(&Utc)),
        }
    }
}

/// Tenant-scoped Toast credentials.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub client_id: String,
    pub client_secret: String,
    pub restaurant_guid: String,
}

impl ConnectRequest {
    fn into_credentials(self) -> Result<IntegrationCredentials, ApiError> {
        let mut missing = serde_json::Map::new();
        for (field, value) in [
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
            ("restaurantGuid", &self.restaurant_guid),
        ] {
            if value.trim().is_empty() {
                missing.insert(field.to_string(), json!("must not be blank"));
            }
        }

        if !missing.is_empty() {
            return Err(validation_error(
                "Missing Toast credentials",
                JsonValue::Object(missing),
            ));
        }

        Ok(IntegrationCredentials {
            client_id: self.client_id.trim().to_string(),
            client_secret: self.client_secret,
            restaurant_guid: self.restaurant_guid.trim().to_string(),
        })
    }
}

/// Partial update of the sync toggles; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub menu_sync_enabled: Option<bool>,
    pub order_push_enabled: Option<bool>,
}

fn not_found() -> ApiError {
    ToastError::NotFound("Toast integration".into()).into()
}

/// Current Toast integration state for the tenant
#[utoipa::path(
    get,
    path = "/integrations/toast",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Integration state", body = IntegrationInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No Toast integration for tenant", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn get_integration(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<IntegrationInfo>, ApiError> {
    let model = state.lifecycle.status(&tenant.0).await?.ok_or_else(not_found)?;
    Ok(Json(model.into()))
}

/// Exchange credentials with Toast and connect the tenant
#[utoipa::path(
    post,
    path = "/integrations/toast/connect",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Integration connected", body = IntegrationInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 502, description = "Toast rejected the credentials", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn connect_integration(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<IntegrationInfo>, ApiError> {
    let credentials = request.into_credentials()?;
    let model = state.lifecycle.connect(&tenant.0, credentials).await?;
    Ok(Json(model.into()))
}

/// Disconnect the tenant and wipe its access token
#[utoipa::path(
    post,
    path = "/integrations/toast/disconnect",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Integration disconnected", body = IntegrationInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No Toast integration for tenant", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn disconnect_integration(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<IntegrationInfo>, ApiError> {
    let model = state.lifecycle.disconnect(&tenant.0).await?;
    Ok(Json(model.into()))
}

/// Toggle scheduled menu sync and automatic order push
#[utoipa::path(
    patch,
    path = "/integrations/toast/settings",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = IntegrationInfo),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No Toast integration for tenant", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<IntegrationInfo>, ApiError> {
    let update = SyncSettingsUpdate {
        menu_sync_enabled: request.menu_sync_enabled,
        order_push_enabled: request.order_push_enabled,
    };
    let model = state.lifecycle.update_settings(&tenant.0, update).await?;
    Ok(Json(model.into()))
}

/// Run a menu sync for the tenant now
///
/// Sync failures are reported in the body with `success: false`.
#[utoipa::path(
    post,
    path = "/integrations/toast/menu-sync",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Sync report", body = MenuSyncReport),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "No Toast integration for tenant", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn trigger_menu_sync(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<MenuSyncReport>, ApiError> {
    state.lifecycle.status(&tenant.0).await?.ok_or_else(not_found)?;
    Ok(Json(state.menu_sync.sync_menu_from_vendor(tenant.0).await))
}

/// Restaurant details as returned by Toast
#[utoipa::path(
    get,
    path = "/integrations/toast/restaurant",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Vendor restaurant document", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Integration not connected", body = ApiError),
        (status = 502, description = "Toast error", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<JsonValue>, ApiError> {
    Ok(Json(state.client.get_restaurant_details(&tenant.0).await?))
}

/// Inventory counts as returned by Toast
#[utoipa::path(
    get,
    path = "/integrations/toast/inventory",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    responses(
        (status = 200, description = "Vendor inventory document", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 409, description = "Integration not connected", body = ApiError),
        (status = 502, description = "Toast error", body = ApiError)
    ),
    tag = "toast"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
) -> Result<Json<JsonValue>, ApiError> {
    Ok(Json(state.client.get_inventory(&tenant.0).await?))
}
