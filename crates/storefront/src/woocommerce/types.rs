//! Wire types for the upstream store's order endpoints.
//!
//! Product and category records stay as raw JSON until normalization (see
//! [`super::conversions`]); orders have a fixed shape and are typed here.
//! `RawOrder` intentionally has no billing, shipping or payment instrument
//! fields, so that data is never even deserialized.

use serde::{Deserialize, Serialize};
use ugames_core::{OrderId, ProductId};

/// Billing or shipping address as the upstream expects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

/// A `{product_id, quantity}` order line. No price: the upstream prices it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPayload {
    pub set_paid: bool,
    pub status: String,
    /// Always the anonymous customer (0).
    pub customer_id: i64,
    pub customer_ip_address: String,
    pub customer_user_agent: String,
    pub billing: Address,
    pub shipping: Address,
    pub line_items: Vec<OrderLineItem>,
    pub customer_note: String,
}

/// The part of the `POST /orders` response the storefront uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrderResponse {
    pub id: OrderId,
    pub order_key: String,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Order as read back by the status tracker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOrder {
    pub id: OrderId,
    #[serde(default)]
    pub order_key: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub line_items: Vec<RawOrderLine>,
    #[serde(default)]
    pub payment_method_title: String,
    #[serde(default)]
    pub customer_note: String,
}

/// A line of a [`RawOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOrderLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub total: String,
}

/// Error body returned by the upstream REST API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UpstreamErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
