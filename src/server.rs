//! # Server Configuration
//!
//! Router assembly, shared state and the serve loop for the Toast gateway API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::crypto::{CryptoError, CryptoKey};
use crate::handlers;
use crate::menu_sync::MenuSyncEngine;
use crate::order_push::{OrderPushGateway, OrderPushSettings};
use crate::repositories::{IntegrationRepository, MenuItemRepository, OrderRepository};
use crate::telemetry::trace_middleware;
use crate::toast::{IntegrationLifecycle, ToastClient, ToastError, ToastSession, ToastTransport};

/// Failures while wiring the gateway's services.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("crypto key is not configured")]
    MissingCryptoKey,
    #[error("invalid crypto key: {0}")]
    Crypto(#[from] CryptoError),
    #[error("failed to build Toast transport: {0}")]
    Transport(#[from] ToastError),
}

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub integrations: IntegrationRepository,
    pub client: ToastClient,
    pub lifecycle: IntegrationLifecycle,
    pub menu_sync: Arc<MenuSyncEngine>,
    pub order_push: OrderPushGateway,
}

impl AppState {
    /// Wires repositories, the Toast session/client and the sync and push services.
    pub fn build(config: Arc<AppConfig>, db: DatabaseConnection) -> Result<Self, StateError> {
        let key_bytes = config.crypto_key.clone().ok_or(StateError::MissingCryptoKey)?;
        let crypto_key = CryptoKey::new(key_bytes)?;
        let shared_db = Arc::new(db.clone());

        let integrations = IntegrationRepository::new(Arc::clone(&shared_db), crypto_key);
        let menu_items = MenuItemRepository::new(Arc::clone(&shared_db));
        let orders = OrderRepository::new(shared_db);

        let transport = ToastTransport::new(&config.toast)?;
        let session = ToastSession::new(
            transport.clone(),
            integrations.clone(),
            config.toast.user_access_type.clone(),
        );
        let client = ToastClient::new(transport, session, integrations.clone());

        let lifecycle = IntegrationLifecycle::new(client.clone(), integrations.clone());
        let menu_sync = Arc::new(MenuSyncEngine::new(
            client.clone(),
            menu_items.clone(),
            integrations.clone(),
        ));
        let order_push = OrderPushGateway::new(
            client.clone(),
            orders,
            menu_items,
            integrations.clone(),
            OrderPushSettings::from(&config.toast),
        );

        Ok(Self {
            config,
            db,
            integrations,
            client,
            lifecycle,
            menu_sync,
            order_push,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/integrations/toast", get(handlers::toast::get_integration))
        .route(
            "/integrations/toast/connect",
            post(handlers::toast::connect_integration),
        )
        .route(
            "/integrations/toast/disconnect",
            post(handlers::toast::disconnect_integration),
        )
        .route(
            "/integrations/toast/settings",
            patch(handlers::toast::update_settings),
        )
        .route(
            "/integrations/toast/menu-sync",
            post(handlers::toast::trigger_menu_sync),
        )
        .route(
            "/integrations/toast/restaurant",
            get(handlers::toast::get_restaurant),
        )
        .route(
            "/integrations/toast/inventory",
            get(handlers::toast::get_inventory),
        )
        .route("/orders/{order_id}/push", post(handlers::orders::push_order))
        .route("/events/order-created", post(handlers::orders::order_created))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_middleware))
}

/// Serves the API until `shutdown` fires.
pub async fn run_server(
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state
        .config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = state.config.profile.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, %profile, "Toast gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Toast gateway stopped");
    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::toast::get_integration,
        crate::handlers::toast::connect_integration,
        crate::handlers::toast::disconnect_integration,
        crate::handlers::toast::update_settings,
        crate::handlers::toast::trigger_menu_sync,
        crate::handlers::toast::get_restaurant,
        crate::handlers::toast::get_inventory,
        crate::handlers::orders::push_order,
        crate::handlers::orders::order_created,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::error::ProviderError,
            crate::models::integration::IntegrationStatus,
            crate::models::integration::IntegrationError,
            crate::handlers::toast::IntegrationInfo,
            crate::handlers::toast::ConnectRequest,
            crate::handlers::toast::SettingsRequest,
            crate::handlers::orders::OrderCreatedEvent,
            crate::handlers::orders::OrderCreatedResponse,
            crate::menu_sync::MenuSyncReport,
            crate::order_push::OrderPushOutcome,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Toast Gateway API",
        description = "Toast POS integration: connection lifecycle, menu sync and order push",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
