//! Typed Toast API operations.
//!
//! Every call resolves the tenant's restaurant guid first, refuses to run
//! unless the integration is enabled and connected, and goes through
//! [`ToastSession::with_auth_retry`].

use metrics::counter;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::error::ToastError;
use super::session::ToastSession;
use super::transport::{RESTAURANT_EXTERNAL_ID_HEADER, ToastTransport};
use super::types::{CreatedOrder, MenuItemsResponse, VendorItem, VendorOrderPayload};
use crate::repositories::IntegrationRepository;

#[derive(Debug, Clone)]
pub struct ToastClient {
    transport: ToastTransport,
    session: ToastSession,
    integrations: IntegrationRepository,
}

/// Whether the restaurant guid is also passed as the `restaurantGuid` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Query,
    HeaderOnly,
}

impl ToastClient {
    pub fn new(
        transport: ToastTransport,
        session: ToastSession,
        integrations: IntegrationRepository,
    ) -> Self {
        Self {
            transport,
            session,
            integrations,
        }
    }

    pub fn session(&self) -> &ToastSession {
        &self.session
    }

    /// Full menu structure.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn fetch_menu(&self, tenant_id: &Uuid) -> Result<JsonValue, ToastError> {
        self.get("fetch_menu", tenant_id, "/menus/v2/menus", Scope::Query)
            .await
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn fetch_menu_items(&self, tenant_id: &Uuid) -> Result<Vec<VendorItem>, ToastError> {
        let response: MenuItemsResponse = self
            .get("fetch_menu_items", tenant_id, "/menus/v2/items", Scope::Query)
            .await?;
        let items = response.into_items();
        debug!(count = items.len(), "Fetched Toast menu items");
        Ok(items)
    }

    #[instrument(skip(self, payload), fields(tenant_id = %tenant_id))]
    pub async fn create_order(
        &self,
        tenant_id: &Uuid,
        payload: &VendorOrderPayload,
    ) -> Result<CreatedOrder, ToastError> {
        let guid = self.restaurant_guid(tenant_id).await?;
        let transport = &self.transport;

        let result = self
            .session
            .with_auth_retry(tenant_id, |token| {
                let request = transport
                    .post("/orders/v2/orders")
                    .query(&[("restaurantGuid", guid.as_str())])
                    .header(RESTAURANT_EXTERNAL_ID_HEADER, guid.as_str())
                    .bearer_auth(token)
                    .json(payload);
                async move { transport.send_json::<CreatedOrder>(request).await }
            })
            .await;

        record_outcome("create_order", &result);
        result
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_inventory(&self, tenant_id: &Uuid) -> Result<JsonValue, ToastError> {
        self.get("get_inventory", tenant_id, "/inventory/v2/counts", Scope::Query)
            .await
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_restaurant_details(&self, tenant_id: &Uuid) -> Result<JsonValue, ToastError> {
        let guid = self.restaurant_guid(tenant_id).await?;
        let path = format!("/restaurants/v2/restaurants/{}", guid);
        self.get_with_guid("get_restaurant_details", tenant_id, &path, &guid, Scope::HeaderOnly)
            .await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        tenant_id: &Uuid,
        path: &str,
        scope: Scope,
    ) -> Result<T, ToastError> {
        let guid = self.restaurant_guid(tenant_id).await?;
        self.get_with_guid(operation, tenant_id, path, &guid, scope)
            .await
    }

    async fn get_with_guid<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        tenant_id: &Uuid,
        path: &str,
        guid: &str,
        scope: Scope,
    ) -> Result<T, ToastError> {
        let transport = &self.transport;

        let result = self
            .session
            .with_auth_retry(tenant_id, |token| {
                let mut request = transport
                    .get(path)
                    .header(RESTAURANT_EXTERNAL_ID_HEADER, guid)
                    .bearer_auth(token);
                if scope == Scope::Query {
                    request = request.query(&[("restaurantGuid", guid)]);
                }
                async move { transport.send_json::<T>(request).await }
            })
            .await;

        record_outcome(operation, &result);
        result
    }

    /// Restaurant guid of an enabled, connected integration.
    async fn restaurant_guid(&self, tenant_id: &Uuid) -> Result<String, ToastError> {
        let integration = self
            .integrations
            .find_toast(tenant_id)
            .await?
            .ok_or_else(|| ToastError::Config("Toast integration not configured".into()))?;

        if !integration.is_active() {
            return Err(ToastError::Config(
                "Toast integration is not enabled and connected".into(),
            ));
        }

        integration
            .restaurant_guid
            .filter(|guid| !guid.trim().is_empty())
            .ok_or_else(|| ToastError::Config("Toast restaurant GUID not configured".into()))
    }
}

fn record_outcome<T>(operation: &'static str, result: &Result<T, ToastError>) {
    match result {
        Ok(_) => {
            counter!("toast_vendor_request_total", "operation" => operation, "outcome" => "success")
                .increment(1);
        }
        Err(error) => {
            counter!(
                "toast_vendor_request_total",
                "operation" => operation,
                "outcome" => error.kind()
            )
            .increment(1);
            warn!(operation, error = %error, "Toast request failed");
        }
    }
}
