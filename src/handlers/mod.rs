//! # API Handlers
//!
//! HTTP endpoint handlers for the Toast gateway.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod orders;
pub mod toast;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}
