//! Menu reconciliation against a mocked Toast catalog.

mod test_utils;

use std::sync::Arc;

use serde_json::json;
use test_utils::*;
use toast_gateway::menu_sync::MENU_SYNC_FAILED;
use toast_gateway::models::menu_item;
use toast_gateway::repositories::MenuItemRepository;
use toast_gateway::repositories::menu_item::ToastItemFields;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_items(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/menus/v2/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn by_guid<'a>(items: &'a [menu_item::Model], guid: &str) -> &'a menu_item::Model {
    items
        .iter()
        .find(|item| item.toast_item_id.as_deref() == Some(guid))
        .unwrap_or_else(|| panic!("no item {guid}"))
}

#[tokio::test]
async fn sync_adds_updates_and_soft_removes() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    insert_toast_item(&state.db, tenant, "A", "Old Burger", false).await.unwrap();
    insert_toast_item(&state.db, tenant, "C", "Chili", false).await.unwrap();
    let manual = insert_manual_item(&state.db, tenant, "House Lemonade").await.unwrap();

    mount_items(
        &server,
        json!({ "items": [vendor_item("A", "Burger", 11.0), vendor_item("B", "Fries", 3.5)] }),
    )
    .await;

    let report = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(report.success, "sync failed: {:?}", report.error);
    assert_eq!(report.items_added, 1);
    assert_eq!(report.items_updated, 1);
    assert_eq!(report.items_removed, 1);
    assert_eq!(report.items_skipped, 0);

    let items = list_menu_items(&state.db).await.unwrap();
    assert_eq!(items.len(), 4);

    let burger = by_guid(&items, "A");
    assert_eq!(burger.name, "Burger");
    assert_eq!(burger.price, 11.0);
    assert_eq!(burger.category, "Mains");
    assert!(burger.available && !burger.removed_from_toast);

    let fries = by_guid(&items, "B");
    assert_eq!(fries.source, menu_item::SOURCE_TOAST);
    assert_eq!(fries.tenant_id, tenant);

    let chili = by_guid(&items, "C");
    assert!(!chili.available);
    assert!(chili.removed_from_toast);

    // Manual items are outside the reconciliation set.
    let lemonade = items.iter().find(|item| item.id == manual).unwrap();
    assert!(lemonade.available && !lemonade.removed_from_toast);

    let integration = load_integration(&state, tenant).await.unwrap();
    assert!(integration.last_menu_sync.is_some());
    assert!(integration.last_error.is_none());
}

#[tokio::test]
async fn reappearing_item_is_restored_and_removed_items_are_not_recounted() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    insert_toast_item(&state.db, tenant, "A", "Burger", true).await.unwrap();
    insert_toast_item(&state.db, tenant, "Z", "Retired Wrap", true).await.unwrap();

    mount_items(&server, json!([vendor_item("A", "Burger", 10.0)])).await;

    let report = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(report.success);
    assert_eq!(report.items_updated, 1);
    assert_eq!(report.items_removed, 0);

    let items = list_menu_items(&state.db).await.unwrap();
    let burger = by_guid(&items, "A");
    assert!(burger.available && !burger.removed_from_toast);
    assert!(by_guid(&items, "Z").removed_from_toast);
}

#[tokio::test]
async fn invalid_and_repeated_vendor_items_are_skipped() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    mount_items(
        &server,
        json!({ "items": [
            vendor_item("A", "Burger", 10.0),
            { "guid": "B" },
            { "name": "Nameless guid" },
            vendor_item("A", "Burger again", 12.0),
            { "guid": "H", "name": "Secret Menu", "visibility": "HIDDEN" }
        ]}),
    )
    .await;

    let report = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(report.success);
    assert_eq!(report.items_added, 2);
    assert_eq!(report.items_skipped, 3);

    let items = list_menu_items(&state.db).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(by_guid(&items, "A").name, "Burger");

    let hidden = by_guid(&items, "H");
    assert!(!hidden.available);
    assert!(!hidden.removed_from_toast);
    assert_eq!(hidden.category, "Uncategorized");
    assert_eq!(hidden.price, 0.0);
}

#[tokio::test]
async fn vendor_failure_is_reported_and_recorded() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();
    insert_toast_item(&state.db, tenant, "A", "Burger", false).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/menus/v2/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let report = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(!report.success);
    assert_eq!(report.items_removed, 0);
    assert!(report.error.unwrap().contains("500"));

    // Local catalog untouched.
    let items = list_menu_items(&state.db).await.unwrap();
    assert!(by_guid(&items, "A").available);

    let integration = load_integration(&state, tenant).await.unwrap();
    assert!(integration.last_menu_sync.is_none());
    assert_eq!(integration.last_error().unwrap().kind, MENU_SYNC_FAILED);
    assert!(integration.is_active());
}

#[tokio::test]
async fn unconfigured_tenant_reports_failure() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();

    let report = state.menu_sync.sync_menu_from_vendor(Uuid::new_v4()).await;
    assert!(!report.success);
    assert!(report.error.is_some());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn repeated_sync_is_idempotent_and_empty_fetch_soft_removes() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    let catalog = json!({ "items": [{
        "guid": "A",
        "name": "Burger",
        "price": 9.99,
        "visibility": "VISIBLE"
    }] });
    mount_items(&server, catalog).await;

    let first = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(first.success, "sync failed: {:?}", first.error);
    assert_eq!(
        (first.items_added, first.items_updated, first.items_removed),
        (1, 0, 0)
    );

    let items = list_menu_items(&state.db).await.unwrap();
    assert_eq!(items.len(), 1);
    let burger = by_guid(&items, "A");
    assert!(burger.available && !burger.removed_from_toast);
    assert_eq!(burger.category, "Uncategorized");

    // Unchanged vendor data only touches the update count.
    let second = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(second.success);
    assert_eq!(
        (second.items_added, second.items_updated, second.items_removed),
        (0, 1, 0)
    );
    assert_eq!(list_menu_items(&state.db).await.unwrap().len(), 1);

    server.reset().await;
    mount_items(&server, json!({ "items": [] })).await;

    let third = state.menu_sync.sync_menu_from_vendor(tenant).await;
    assert!(third.success);
    assert_eq!(
        (third.items_added, third.items_updated, third.items_removed),
        (0, 0, 1)
    );

    let items = list_menu_items(&state.db).await.unwrap();
    assert_eq!(items.len(), 1);
    let burger = by_guid(&items, "A");
    assert!(!burger.available);
    assert!(burger.removed_from_toast);
}

#[tokio::test]
async fn toast_item_ids_are_unique_per_tenant() {
    let db = Arc::new(setup_test_db().await.unwrap());
    let repo = MenuItemRepository::new(Arc::clone(&db));
    let tenant = Uuid::new_v4();
    let other_tenant = Uuid::new_v4();

    let fields = ToastItemFields {
        toast_item_id: "A".to_string(),
        name: "Burger".to_string(),
        description: None,
        category: "Mains".to_string(),
        price: 9.0,
        available: true,
        toast_metadata: None,
    };

    repo.insert_toast_item(&tenant, fields.clone()).await.unwrap();
    assert!(repo.insert_toast_item(&tenant, fields.clone()).await.is_err());
    repo.insert_toast_item(&other_tenant, fields).await.unwrap();

    assert_eq!(repo.list_toast_items(&tenant).await.unwrap().len(), 1);
    assert_eq!(repo.list_toast_items(&other_tenant).await.unwrap().len(), 1);
}
