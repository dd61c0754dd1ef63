//! Test utilities for database and vendor-API testing.
//!
//! Provides an in-memory SQLite database with migrations applied, fixture
//! helpers for integrations, menu items and orders, and a fully wired
//! [`AppState`] pointed at a wiremock server standing in for Toast.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use serde_json::{Value as JsonValue, json};
use toast_gateway::config::AppConfig;
use toast_gateway::crypto::CryptoKey;
use toast_gateway::models::{integration, menu_item, order};
use toast_gateway::repositories::IntegrationRepository;
use toast_gateway::repositories::integration::IntegrationCredentials;
use toast_gateway::server::AppState;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_OPERATOR_TOKEN: &str = "test-operator-token";
pub const LOGIN_PATH: &str = "/authentication/v1/authentication/login";
pub const STORED_TOKEN: &str = "stored-token";
pub const FRESH_TOKEN: &str = "fresh-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_crypto_key() -> CryptoKey {
    CryptoKey::new(vec![7u8; 32]).expect("valid test key")
}

/// Configuration with secrets filled in and the vendor base pointed at `api_base`.
pub fn test_config(api_base: &str) -> AppConfig {
    let mut config = AppConfig {
        operator_tokens: vec![TEST_OPERATOR_TOKEN.to_string()],
        crypto_key: Some(vec![7u8; 32]),
        database_url: "sqlite::memory:".to_string(),
        ..Default::default()
    };
    config.toast.api_base = Some(api_base.to_string());
    config.toast.http_timeout_seconds = 5;
    config
}

/// Fresh database plus every service wired against `server`.
pub async fn setup_state(server: &MockServer) -> Result<AppState> {
    setup_state_with(server, |_| {}).await
}

/// Like [`setup_state`], with the test configuration adjusted by `configure`.
pub async fn setup_state_with<F>(server: &MockServer, configure: F) -> Result<AppState>
where
    F: FnOnce(&mut AppConfig),
{
    let db = setup_test_db().await?;
    let mut config = test_config(&server.uri());
    configure(&mut config);
    Ok(AppState::build(Arc::new(config), db)?)
}

pub fn integration_repo(state: &AppState) -> IntegrationRepository {
    state.integrations.clone()
}

/// Creates a connected, enabled integration holding [`STORED_TOKEN`].
pub async fn connect_tenant(
    state: &AppState,
    tenant_id: Uuid,
    restaurant_guid: &str,
) -> Result<integration::Model> {
    let credentials = IntegrationCredentials {
        client_id: format!("client-{}", restaurant_guid),
        client_secret: "client-secret".to_string(),
        restaurant_guid: restaurant_guid.to_string(),
    };
    state
        .integrations
        .mark_connected(&tenant_id, &credentials, STORED_TOKEN, None)
        .await
}

/// Applies a raw change to the tenant's integration row.
pub async fn update_integration<F>(state: &AppState, tenant_id: Uuid, change: F) -> Result<()>
where
    F: FnOnce(&mut integration::ActiveModel),
{
    let model = state
        .integrations
        .find_toast(&tenant_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("integration missing"))?;
    let mut active: integration::ActiveModel = model.into();
    change(&mut active);
    active.update(&state.db).await?;
    Ok(())
}

pub async fn clear_access_token(state: &AppState, tenant_id: Uuid) -> Result<()> {
    update_integration(state, tenant_id, |active| {
        active.access_token_ciphertext = Set(None);
    })
    .await
}

pub async fn load_integration(state: &AppState, tenant_id: Uuid) -> Result<integration::Model> {
    state
        .integrations
        .find_toast(&tenant_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("integration missing"))
}

/// Inserts a Toast-sourced menu item.
pub async fn insert_toast_item(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    guid: &str,
    name: &str,
    removed: bool,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    menu_item::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        source: Set(menu_item::SOURCE_TOAST.to_string()),
        toast_item_id: Set(Some(guid.to_string())),
        name: Set(name.to_string()),
        description: Set(None),
        category: Set("Mains".to_string()),
        price: Set(10.0),
        available: Set(!removed),
        removed_from_toast: Set(removed),
        toast_metadata: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

/// Inserts a manually entered menu item.
pub async fn insert_manual_item(db: &DatabaseConnection, tenant_id: Uuid, name: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    menu_item::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        source: Set(menu_item::SOURCE_MANUAL.to_string()),
        toast_item_id: Set(None),
        name: Set(name.to_string()),
        description: Set(None),
        category: Set("Specials".to_string()),
        price: Set(4.5),
        available: Set(true),
        removed_from_toast: Set(false),
        toast_metadata: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn list_menu_items(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    Ok(menu_item::Entity::find().all(db).await?)
}

/// Inserts a pending order with the given line items.
pub async fn insert_order(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    channel: &str,
    items: JsonValue,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    order::ActiveModel {
        id: Set(id),
        tenant_id: Set(tenant_id),
        channel: Set(channel.to_string()),
        customer_name: Set(Some("Grace Hopper".to_string())),
        customer_phone: Set(Some("555-0199".to_string())),
        customer_email: Set(None),
        order_type: Set("pickup".to_string()),
        requested_pickup_time: Set(None),
        items: Set(items),
        total: Set(21.0),
        status: Set("pending".to_string()),
        pos_order_id: Set(None),
        pos_status: Set(None),
        pos_error: Set(None),
        pos_order_number: Set(None),
        pos_pushed_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;
    Ok(id)
}

pub async fn load_order(db: &DatabaseConnection, order_id: Uuid) -> Result<order::Model> {
    order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order missing"))
}

/// Vendor login response in the nested shape Toast returns.
pub fn login_body(access_token: &str) -> JsonValue {
    json!({
        "token": {
            "accessToken": access_token,
            "expiresIn": 86400,
            "tokenType": "Bearer"
        },
        "status": "SUCCESS"
    })
}

/// Mounts a login endpoint that always issues [`FRESH_TOKEN`].
pub async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(FRESH_TOKEN)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Vendor menu item document.
pub fn vendor_item(guid: &str, name: &str, price: f64) -> JsonValue {
    json!({
        "guid": guid,
        "name": name,
        "price": price,
        "salesCategory": { "guid": "cat-1", "name": "Mains" },
        "visibility": "ALL"
    })
}
