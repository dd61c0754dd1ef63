//! OAuth session handling for Toast.
//!
//! Tokens are read as stored and never checked for expiry locally; the
//! vendor's own 401 is the signal to refresh. [`ToastSession::with_auth_retry`]
//! wraps each vendor call with at most one refresh and one retry.

use std::future::Future;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::ToastError;
use super::transport::ToastTransport;
use super::types::{IssuedToken, LoginRequest, LoginResponse};
use crate::models::integration::IntegrationError;
use crate::repositories::IntegrationRepository;

const LOGIN_PATH: &str = "/authentication/v1/authentication/login";

/// Failure type written to `last_error` when a refresh fails.
pub const TOKEN_REFRESH_FAILED: &str = "token_refresh_failed";

#[derive(Debug, Clone)]
pub struct ToastSession {
    transport: ToastTransport,
    integrations: IntegrationRepository,
    user_access_type: String,
}

impl ToastSession {
    pub fn new(
        transport: ToastTransport,
        integrations: IntegrationRepository,
        user_access_type: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            integrations,
            user_access_type: user_access_type.into(),
        }
    }

    /// Stored access token for the tenant, without expiry validation.
    pub async fn get_access_token(&self, tenant_id: &Uuid) -> Result<Option<String>, ToastError> {
        let Some(integration) = self.integrations.find_toast(tenant_id).await? else {
            return Ok(None);
        };
        Ok(self.integrations.access_token(&integration)?)
    }

    /// Client-credentials exchange against the login endpoint.
    pub async fn exchange_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<IssuedToken, ToastError> {
        let body = LoginRequest {
            client_id,
            client_secret,
            user_access_type: &self.user_access_type,
        };

        let response: LoginResponse = self
            .transport
            .send_json(self.transport.post(LOGIN_PATH).json(&body))
            .await?;

        response
            .into_token(Utc::now())
            .ok_or_else(|| ToastError::Decode("login response carried no access token".into()))
    }

    /// Obtains a new token from the stored client credentials and persists it.
    ///
    /// A failure is recorded on the integration as `token_refresh_failed`; the
    /// connection status is left untouched.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn refresh(&self, tenant_id: &Uuid) -> Result<String, ToastError> {
        match self.try_refresh(tenant_id).await {
            Ok(token) => {
                counter!("toast_token_refresh_total", "outcome" => "success").increment(1);
                info!("Toast access token refreshed");
                Ok(token)
            }
            Err(error) => {
                counter!("toast_token_refresh_total", "outcome" => "failure").increment(1);
                warn!(error = %error, kind = error.kind(), "Toast token refresh failed");

                let trail = IntegrationError::new(TOKEN_REFRESH_FAILED, error.to_string());
                if let Err(record_err) = self.integrations.record_error(tenant_id, &trail).await {
                    warn!(error = ?record_err, "Failed to record token refresh failure");
                }
                Err(error)
            }
        }
    }

    async fn try_refresh(&self, tenant_id: &Uuid) -> Result<String, ToastError> {
        let integration = self
            .integrations
            .find_toast(tenant_id)
            .await?
            .ok_or_else(|| ToastError::Auth("no Toast integration for tenant".into()))?;

        let client_id = integration
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ToastError::Auth("no client credentials stored".into()))?;
        let client_secret = self
            .integrations
            .client_secret(&integration)?
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ToastError::Auth("no client credentials stored".into()))?;

        let issued = self.exchange_credentials(&client_id, &client_secret).await?;
        self.integrations
            .store_access_token(tenant_id, &issued.access_token, issued.expires_at)
            .await?;

        Ok(issued.access_token)
    }

    /// Runs `call` with a bearer token, refreshing at most once.
    ///
    /// A missing token is refreshed up front. Otherwise a 401 from `call`
    /// triggers one refresh and one retry. A 401 after any refresh is final.
    pub async fn with_auth_retry<T, F, Fut>(
        &self,
        tenant_id: &Uuid,
        mut call: F,
    ) -> Result<T, ToastError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, ToastError>>,
    {
        let (token, refreshed) = match self.get_access_token(tenant_id).await? {
            Some(token) => (token, false),
            None => {
                debug!(tenant_id = %tenant_id, "No stored Toast token, refreshing before use");
                (self.refresh(tenant_id).await?, true)
            }
        };

        match call(token).await {
            Err(error) if error.is_unauthorized() && !refreshed => {
                debug!(tenant_id = %tenant_id, "Toast rejected token, refreshing once");
                let token = self.refresh(tenant_id).await?;
                call(token).await
            }
            outcome => outcome,
        }
    }
}
