//! Connect, disconnect and settings changes for a tenant's Toast integration.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::client::ToastClient;
use super::error::ToastError;
use super::types::restaurant_name;
use crate::models::integration::{self, IntegrationError};
use crate::repositories::IntegrationRepository;
use crate::repositories::integration::{IntegrationCredentials, SyncSettingsUpdate};

/// Failure type written to `last_error` when a connect attempt fails.
pub const CONNECT_FAILED: &str = "connect_failed";

#[derive(Debug, Clone)]
pub struct IntegrationLifecycle {
    client: ToastClient,
    integrations: IntegrationRepository,
}

impl IntegrationLifecycle {
    pub fn new(client: ToastClient, integrations: IntegrationRepository) -> Self {
        Self {
            client,
            integrations,
        }
    }

    pub async fn status(&self, tenant_id: &Uuid) -> Result<Option<integration::Model>, ToastError> {
        Ok(self.integrations.find_toast(tenant_id).await?)
    }

    /// `disconnected -> connected` on a successful credential exchange.
    ///
    /// A failed exchange leaves the status as it was and records `connect_failed`.
    #[instrument(skip(self, credentials), fields(tenant_id = %tenant_id))]
    pub async fn connect(
        &self,
        tenant_id: &Uuid,
        credentials: IntegrationCredentials,
    ) -> Result<integration::Model, ToastError> {
        let issued = match self
            .client
            .session()
            .exchange_credentials(&credentials.client_id, &credentials.client_secret)
            .await
        {
            Ok(issued) => issued,
            Err(error) => {
                warn!(error = %error, "Toast credential exchange failed");
                let trail = IntegrationError::new(CONNECT_FAILED, error.to_string());
                if let Err(record_err) = self.integrations.record_error(tenant_id, &trail).await {
                    warn!(error = ?record_err, "Failed to record connect failure");
                }
                return Err(error);
            }
        };

        let mut connected = self
            .integrations
            .mark_connected(tenant_id, &credentials, &issued.access_token, issued.expires_at)
            .await?;
        info!(restaurant_guid = %credentials.restaurant_guid, "Toast integration connected");

        // A failed name lookup or write does not undo the connect.
        match self.client.get_restaurant_details(tenant_id).await {
            Ok(details) => {
                if let Some(name) = restaurant_name(&details) {
                    match self.integrations.set_restaurant_name(tenant_id, &name).await {
                        Ok(updated) => connected = updated,
                        Err(error) => warn!(error = ?error, "Could not store Toast restaurant name"),
                    }
                }
            }
            Err(error) => warn!(error = %error, "Could not fetch Toast restaurant details"),
        }

        Ok(connected)
    }

    /// `connected -> disconnected`. Credentials are kept so the tenant can reconnect.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn disconnect(&self, tenant_id: &Uuid) -> Result<integration::Model, ToastError> {
        self.require(tenant_id).await?;
        let model = self.integrations.mark_disconnected(tenant_id).await?;
        info!("Toast integration disconnected");
        Ok(model)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn update_settings(
        &self,
        tenant_id: &Uuid,
        update: SyncSettingsUpdate,
    ) -> Result<integration::Model, ToastError> {
        self.require(tenant_id).await?;
        Ok(self.integrations.update_sync_settings(tenant_id, update).await?)
    }

    async fn require(&self, tenant_id: &Uuid) -> Result<integration::Model, ToastError> {
        self.integrations
            .find_toast(tenant_id)
            .await?
            .ok_or_else(|| ToastError::NotFound("Toast integration".into()))
    }
}
