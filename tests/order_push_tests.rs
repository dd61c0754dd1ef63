//! Order push and the order-created trigger against a mocked Toast API.

mod test_utils;

use sea_orm::Set;
use serde_json::json;
use test_utils::*;
use toast_gateway::models::order::PosError;
use toast_gateway::order_push::pos_order_number;
use toast_gateway::toast::ToastError;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_create_order(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/orders/v2/orders"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn push_sends_resolved_lines_and_records_outcome() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    let burger = insert_toast_item(&state.db, tenant, "G-BURGER", "Burger", false).await.unwrap();
    insert_toast_item(&state.db, tenant, "G-FRIES", "Fries", false).await.unwrap();
    let order_id = insert_order(
        &state.db,
        tenant,
        "web",
        json!([
            { "menuItemId": burger, "name": "Cheeseburger", "quantity": 2 },
            { "name": "fries", "quantity": 1, "specialInstructions": "extra salt" },
            { "name": "Dragon Roll", "quantity": 1 }
        ]),
    )
    .await
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/orders/v2/orders"))
        .and(body_partial_json(json!({
            "entityType": "Order",
            "source": "VoiceAgent",
            "orderType": "TAKEOUT",
            "checks": [{
                "customer": { "firstName": "Grace", "lastName": "Hopper", "phone": "555-0199" },
                "selections": [
                    { "item": { "guid": "G-BURGER", "entityType": "MenuItem" }, "quantity": 2 },
                    { "item": { "guid": "G-FRIES", "entityType": "MenuItem" }, "quantity": 1,
                      "specialRequest": "extra salt" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "guid": "toast-order-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = state.order_push.push_order(tenant, order_id).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.vendor_order_id.as_deref(), Some("toast-order-1"));
    assert_eq!(outcome.dropped_items, vec!["Dragon Roll".to_string()]);
    let number = pos_order_number(&order_id);
    assert_eq!(outcome.pos_order_number.as_deref(), Some(number.as_str()));

    let order = load_order(&state.db, order_id).await.unwrap();
    assert_eq!(order.pos_order_id.as_deref(), Some("toast-order-1"));
    assert_eq!(order.pos_status.as_deref(), Some("sent_to_pos"));
    assert_eq!(order.pos_order_number.as_deref(), Some(number.as_str()));
    assert!(order.pos_error.is_none());
    assert!(order.pos_pushed_at.is_some());
}

#[tokio::test]
async fn order_without_resolvable_items_is_not_submitted() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();
    insert_toast_item(&state.db, tenant, "G-OLD", "Onion Rings", true).await.unwrap();

    let order_id = insert_order(
        &state.db,
        tenant,
        "voice_agent",
        json!([{ "name": "Onion Rings" }, { "name": "Mystery Dish" }]),
    )
    .await
    .unwrap();

    mount_create_order(&server, ResponseTemplate::new(200), 0).await;

    let outcome = state.order_push.push_order(tenant, order_id).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.is_some());

    let order = load_order(&state.db, order_id).await.unwrap();
    assert_eq!(order.pos_status.as_deref(), Some("push_failed"));
    let error: PosError = serde_json::from_value(order.pos_error.unwrap()).unwrap();
    assert!(error.message.contains("matched"));
}

#[tokio::test]
async fn vendor_rejection_marks_push_failed_and_clears_previous_success() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();
    insert_toast_item(&state.db, tenant, "G-BURGER", "Burger", false).await.unwrap();

    let order_id = insert_order(&state.db, tenant, "voice_agent", json!([{ "name": "Burger" }]))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/orders/v2/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "guid": "first" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_create_order(
        &server,
        ResponseTemplate::new(400).set_body_string("restaurant closed"),
        1,
    )
    .await;

    let first = state.order_push.push_order(tenant, order_id).await.unwrap();
    assert!(first.success);

    let second = state.order_push.push_order(tenant, order_id).await.unwrap();
    assert!(!second.success);
    assert!(second.error.as_deref().unwrap().contains("restaurant closed"));

    let order = load_order(&state.db, order_id).await.unwrap();
    assert_eq!(order.pos_status.as_deref(), Some("push_failed"));
    assert!(order.pos_order_id.is_none());
    assert!(order.pos_order_number.is_none());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();

    let error = state
        .order_push
        .push_order(tenant, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(error, ToastError::NotFound(_)));
}

#[tokio::test]
async fn orders_are_tenant_scoped() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    connect_tenant(&state, other, "rest-2").await.unwrap();

    let order_id = insert_order(&state.db, owner, "voice_agent", json!([{ "name": "Burger" }]))
        .await
        .unwrap();

    let error = state.order_push.push_order(other, order_id).await.unwrap_err();
    assert!(matches!(error, ToastError::NotFound(_)));
}

#[tokio::test]
async fn order_created_hook_only_pushes_voice_orders_with_push_enabled() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();
    insert_toast_item(&state.db, tenant, "G-BURGER", "Burger", false).await.unwrap();

    mount_create_order(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "id": 4242 })),
        1,
    )
    .await;

    let web_order = insert_order(&state.db, tenant, "web", json!([{ "name": "Burger" }]))
        .await
        .unwrap();
    let voice_order = insert_order(&state.db, tenant, "ai_phone", json!([{ "name": "Burger" }]))
        .await
        .unwrap();

    // Order push defaults to off.
    assert!(state.order_push.on_order_created(tenant, voice_order).await.is_none());

    update_integration(&state, tenant, |active| {
        active.order_push_enabled = Set(true);
    })
    .await
    .unwrap();

    assert!(state.order_push.on_order_created(tenant, web_order).await.is_none());
    assert!(state.order_push.on_order_created(tenant, Uuid::new_v4()).await.is_none());

    let outcome = state
        .order_push
        .on_order_created(tenant, voice_order)
        .await
        .expect("voice order pushed");
    assert!(outcome.success);
    assert_eq!(outcome.vendor_order_id.as_deref(), Some("4242"));

    let untouched = load_order(&state.db, web_order).await.unwrap();
    assert!(untouched.pos_status.is_none());
}

#[tokio::test]
async fn order_created_hook_skips_disconnected_tenant() {
    let server = MockServer::start().await;
    let state = setup_state(&server).await.unwrap();
    let tenant = Uuid::new_v4();
    connect_tenant(&state, tenant, "rest-1").await.unwrap();
    update_integration(&state, tenant, |active| {
        active.order_push_enabled = Set(true);
        active.enabled = Set(false);
    })
    .await
    .unwrap();

    let order_id = insert_order(&state.db, tenant, "voice_agent", json!([{ "name": "Burger" }]))
        .await
        .unwrap();

    assert!(state.order_push.on_order_created(tenant, order_id).await.is_none());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
