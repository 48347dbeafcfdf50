//! Checkout and order status API.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use ugames_core::{OrderId, OrderItem};

use crate::error::{AppError, Result};
use crate::orders::{ClientContext, CustomerInfo, OrderStatusView, OrderView, RedirectDecision};
use crate::state::AppState;

/// Body of `POST /api/create-order`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order_key: String,
    pub payment_url: String,
}

/// Create an order from the cart and return where to pay.
///
/// POST /api/create-order
///
/// # Errors
///
/// 400 for a malformed body, an empty cart or invalid items; 500 when the
/// store rejects or cannot be reached.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>> {
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let client = ClientContext::from_headers(&headers);

    let created = state
        .orders()
        .create_order(&request.items, request.customer.as_ref(), &client)
        .await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: created.order_id,
        order_key: created.order_key,
        payment_url: created.payment_url,
    }))
}

/// Query of `GET /api/order-status`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderStatusQuery {
    pub order_id: Option<String>,
    pub key: Option<String>,
    /// Result page the browser is on, if any.
    pub view: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    pub success: bool,
    pub order: OrderStatusView,
    pub view: OrderView,
    pub redirect: Option<String>,
}

/// Read an order's status and where the browser belongs.
///
/// GET /api/order-status?order_id=&key=[&view=]
///
/// # Errors
///
/// 400 for a missing or malformed id, 403 for a wrong key, 404 for an
/// unknown order, 500 when the store cannot be reached.
pub async fn order_status(
    State(state): State<AppState>,
    Query(query): Query<OrderStatusQuery>,
) -> Result<Json<OrderStatusResponse>> {
    let order_id: OrderId = query
        .order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("order_id is required".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("order_id must be a number".to_string()))?;
    let key = query.key.unwrap_or_default();
    let current_view = query.view.as_deref().and_then(|v| v.parse().ok());

    let order = state.tracker().get_order_status(order_id, &key).await?;

    let redirect = match state
        .tracker()
        .route(order.status, current_view, order_id, key.trim())
    {
        RedirectDecision::Stay => None,
        RedirectDecision::Redirect(url) => Some(url),
    };

    Ok(Json(OrderStatusResponse {
        success: true,
        view: OrderView::for_status(order.status),
        order,
        redirect,
    }))
}
