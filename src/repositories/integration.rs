//! Integration repository for database operations
//!
//! Encapsulates SeaORM access to the `integrations` table. Secrets are sealed
//! with the tenant/provider AAD on the way in and opened on the way out; no
//! plaintext secret is ever written or logged.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::{CryptoKey, open_secret, seal_secret};
use crate::models::integration::{
    self, Entity as Integration, IntegrationError, IntegrationStatus, TOAST_PROVIDER,
};

/// Tenant-scoped vendor credentials supplied at connect time.
#[derive(Debug, Clone)]
pub struct IntegrationCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub restaurant_guid: String,
}

/// Partial update of the per-tenant sync toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncSettingsUpdate {
    pub menu_sync_enabled: Option<bool>,
    pub order_push_enabled: Option<bool>,
}

/// Repository for integration database operations
#[derive(Debug, Clone)]
pub struct IntegrationRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Crypto key for secret encryption
    pub crypto_key: CryptoKey,
}

impl IntegrationRepository {
    pub fn new(db: Arc<DatabaseConnection>, crypto_key: CryptoKey) -> Self {
        Self { db, crypto_key }
    }

    /// Finds the Toast integration for a tenant.
    pub async fn find_toast(&self, tenant_id: &Uuid) -> Result<Option<integration::Model>> {
        Ok(Integration::find()
            .filter(integration::Column::TenantId.eq(*tenant_id))
            .filter(integration::Column::Provider.eq(TOAST_PROVIDER))
            .one(&*self.db)
            .await?)
    }

    async fn require_toast(&self, tenant_id: &Uuid) -> Result<integration::Model> {
        self.find_toast(tenant_id)
            .await?
            .ok_or_else(|| anyhow!("Toast integration for tenant '{}' not found", tenant_id))
    }

    /// Tenants eligible for the scheduled menu sync, oldest integration first.
    pub async fn list_scheduled_menu_sync(&self) -> Result<Vec<integration::Model>> {
        Ok(Integration::find()
            .filter(integration::Column::Provider.eq(TOAST_PROVIDER))
            .filter(integration::Column::Enabled.eq(true))
            .filter(integration::Column::MenuSyncEnabled.eq(true))
            .order_by_asc(integration::Column::CreatedAt)
            .order_by_asc(integration::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Opens the stored access token, if any.
    pub fn access_token(&self, model: &integration::Model) -> Result<Option<String>> {
        model
            .access_token_ciphertext
            .as_deref()
            .map(|ciphertext| self.open(model, ciphertext))
            .transpose()
    }

    /// Opens the stored client secret, if any.
    pub fn client_secret(&self, model: &integration::Model) -> Result<Option<String>> {
        model
            .client_secret_ciphertext
            .as_deref()
            .map(|ciphertext| self.open(model, ciphertext))
            .transpose()
    }

    fn open(&self, model: &integration::Model, ciphertext: &[u8]) -> Result<String> {
        open_secret(&self.crypto_key, model.tenant_id, &model.provider, ciphertext).map_err(|e| {
            tracing::error!(
                tenant_id = %model.tenant_id,
                provider = %model.provider,
                "Secret decryption failed"
            );
            anyhow!("Secret decryption failed: {}", e)
        })
    }

    fn seal(&self, tenant_id: &Uuid, secret: &str) -> Result<Vec<u8>> {
        seal_secret(&self.crypto_key, *tenant_id, TOAST_PROVIDER, secret)
            .map_err(|e| anyhow!("Secret encryption failed: {}", e))
    }

    /// Persists a freshly issued access token.
    pub async fn store_access_token(
        &self,
        tenant_id: &Uuid,
        access_token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<integration::Model> {
        let model = self.require_toast(tenant_id).await?;
        let ciphertext = self.seal(tenant_id, access_token)?;

        let mut active: integration::ActiveModel = model.into();
        active.access_token_ciphertext = Set(Some(ciphertext));
        active.token_expires_at = Set(expires_at.map(Into::into));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    /// Stores credentials and token from a successful connect, creating the record when absent.
    pub async fn mark_connected(
        &self,
        tenant_id: &Uuid,
        credentials: &IntegrationCredentials,
        access_token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<integration::Model> {
        let secret_ciphertext = self.seal(tenant_id, &credentials.client_secret)?;
        let token_ciphertext = self.seal(tenant_id, access_token)?;
        let now = Utc::now();
        let existing = self.find_toast(tenant_id).await?;
        let is_new = existing.is_none();

        let mut active = match existing {
            Some(model) => model.into(),
            None => integration::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(*tenant_id),
                provider: Set(TOAST_PROVIDER.to_string()),
                restaurant_name: Set(None),
                menu_sync_enabled: Set(true),
                order_push_enabled: Set(false),
                last_menu_sync: Set(None),
                created_at: Set(now.into()),
                ..Default::default()
            },
        };

        active.enabled = Set(true);
        active.status = Set(IntegrationStatus::Connected.as_str().to_string());
        active.client_id = Set(Some(credentials.client_id.clone()));
        active.client_secret_ciphertext = Set(Some(secret_ciphertext));
        active.restaurant_guid = Set(Some(credentials.restaurant_guid.clone()));
        active.access_token_ciphertext = Set(Some(token_ciphertext));
        active.token_expires_at = Set(expires_at.map(Into::into));
        active.last_error = Set(None);
        active.updated_at = Set(now.into());

        if is_new {
            active.insert(&*self.db).await?;
            // Read back through the tenant lookup so the caller sees the stored row.
            self.require_toast(tenant_id).await
        } else {
            Ok(active.update(&*self.db).await?)
        }
    }

    /// Switches the integration off and wipes the token; credentials stay for reconnection.
    pub async fn mark_disconnected(&self, tenant_id: &Uuid) -> Result<integration::Model> {
        let model = self.require_toast(tenant_id).await?;

        let mut active: integration::ActiveModel = model.into();
        active.enabled = Set(false);
        active.status = Set(IntegrationStatus::Disconnected.as_str().to_string());
        active.access_token_ciphertext = Set(None);
        active.token_expires_at = Set(None);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn set_restaurant_name(
        &self,
        tenant_id: &Uuid,
        restaurant_name: &str,
    ) -> Result<integration::Model> {
        let model = self.require_toast(tenant_id).await?;

        let mut active: integration::ActiveModel = model.into();
        active.restaurant_name = Set(Some(restaurant_name.to_string()));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    pub async fn update_sync_settings(
        &self,
        tenant_id: &Uuid,
        update: SyncSettingsUpdate,
    ) -> Result<integration::Model> {
        let model = self.require_toast(tenant_id).await?;

        let mut active: integration::ActiveModel = model.into();
        if let Some(enabled) = update.menu_sync_enabled {
            active.menu_sync_enabled = Set(enabled);
        }
        if let Some(enabled) = update.order_push_enabled {
            active.order_push_enabled = Set(enabled);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    /// Records a successful menu sync and clears the failure trail.
    pub async fn record_menu_sync(
        &self,
        tenant_id: &Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<integration::Model> {
        let model = self.require_toast(tenant_id).await?;

        let mut active: integration::ActiveModel = model.into();
        active.last_menu_sync = Set(Some(completed_at.into()));
        active.last_error = Set(None);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    /// Writes `last_error` without touching status. A missing record is a no-op.
    pub async fn record_error(
        &self,
        tenant_id: &Uuid,
        error: &IntegrationError,
    ) -> Result<Option<integration::Model>> {
        let Some(model) = self.find_toast(tenant_id).await? else {
            return Ok(None);
        };

        let mut active: integration::ActiveModel = model.into();
        active.last_error = Set(Some(serde_json::to_value(error)?));
        active.updated_at = Set(Utc::now().into());
        Ok(Some(active.update(&*self.db).await?))
    }
}
