//! # Order Handlers
//!
//! Manual order push and the order-created trigger hook.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::order_push::OrderPushOutcome;
use crate::server::AppState;

/// Notification that an order was captured locally.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    #[schema(value_type = String)]
    pub order_id: Uuid,
}

/// Result of the order-created hook.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    /// False when the order did not qualify for an automatic push
    pub pushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OrderPushOutcome>,
}

/// Push a local order to Toast
///
/// Vendor-side failures are returned with `success: false` and recorded on the order.
#[utoipa::path(
    post,
    path = "/orders/{order_id}/push",
    security(("bearer_auth" = [])),
    params(
        TenantHeader,
        ("order_id" = String, Path, description = "Local order id")
    ),
    responses(
        (status = 200, description = "Push outcome", body = OrderPushOutcome),
        (status = 401, description = "Unauthorized", body = ApiError),
        (status = 404, description = "Order not found", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn push_order(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderPushOutcome>, ApiError> {
    let outcome = state.order_push.push_order(tenant.0, order_id).await?;
    Ok(Json(outcome))
}

/// Order-created trigger
///
/// Pushes automated voice orders when the tenant has order push enabled. Never fails
/// because of the push itself.
#[utoipa::path(
    post,
    path = "/events/order-created",
    security(("bearer_auth" = [])),
    params(TenantHeader),
    request_body = OrderCreatedEvent,
    responses(
        (status = 200, description = "Hook processed", body = OrderCreatedResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "orders"
)]
pub async fn order_created(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    TenantExtension(tenant): TenantExtension,
    Json(event): Json<OrderCreatedEvent>,
) -> Json<OrderCreatedResponse> {
    let outcome = state.order_push.on_order_created(tenant.0, event.order_id).await;
    Json(OrderCreatedResponse {
        pushed: outcome.is_some(),
        outcome,
    })
}
