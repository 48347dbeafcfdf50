//! Order creation.

use std::sync::Arc;

use axum::http::HeaderMap;
use thiserror::Error;
use tracing::{info, instrument, warn};
use ugames_core::{Email, EmailError, OrderId, OrderItem};
use url::Url;

use super::billing::{CustomerInfo, GuestIdentity, complete_address};
use crate::config::CheckoutConfig;
use crate::error::add_breadcrumb;
use crate::woocommerce::{
    FailureCategory, OrderLineItem, OrderPayload, StoreApi, StoreError,
};

/// Client IP sent upstream when the request carries no forwarding headers.
pub const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

/// User agent sent upstream when the request has none.
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (compatible; ugames-storefront)";

/// Customer note attached when the shopper leaves none.
pub const DEFAULT_ORDER_NOTE: &str = "Order created via headless storefront";

/// Errors from [`OrderOrchestrator::create_order`].
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity for product {product_id}")]
    InvalidItem { product_id: i64 },

    #[error("Invalid customer details: {0}")]
    InvalidCustomer(#[source] EmailError),

    /// The upstream refused or failed to create the order.
    #[error("Order creation failed ({cause}): {message}")]
    Creation {
        status: Option<u16>,
        cause: FailureCategory,
        message: String,
    },
}

impl OrderError {
    /// Whether the caller sent something unacceptable, as opposed to an
    /// upstream failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart | Self::InvalidItem { .. } | Self::InvalidCustomer(_)
        )
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        };
        Self::Creation {
            status,
            cause: err.category(),
            message: err.to_string(),
        }
    }
}

/// Request metadata forwarded with the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: String,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            ip: FALLBACK_CLIENT_IP.to_string(),
            user_agent: FALLBACK_USER_AGENT.to_string(),
        }
    }
}

impl ClientContext {
    /// Client IP from the first `X-Forwarded-For` hop, else `X-Real-IP`;
    /// user agent from `User-Agent`. Missing values use the fallbacks.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let forwarded = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Self {
            ip: forwarded
                .or_else(|| header("x-real-ip"))
                .unwrap_or(FALLBACK_CLIENT_IP)
                .to_string(),
            user_agent: header("user-agent")
                .unwrap_or(FALLBACK_USER_AGENT)
                .to_string(),
        }
    }
}

/// A created order and where to send the shopper to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub order_key: String,
    pub payment_url: String,
}

/// Builds order payloads and submits them upstream.
pub struct OrderOrchestrator {
    store: Arc<dyn StoreApi>,
    guest: GuestIdentity,
    default_country: String,
    store_url: Url,
}

impl OrderOrchestrator {
    /// # Errors
    ///
    /// Returns an error if the guest email domain cannot form a valid address.
    pub fn new(
        store: Arc<dyn StoreApi>,
        checkout: &CheckoutConfig,
        store_url: Url,
    ) -> Result<Self, EmailError> {
        Email::guest(0, &checkout.guest_email_domain)?;

        Ok(Self {
            store,
            guest: GuestIdentity::new(&checkout.guest_email_domain),
            default_country: checkout.default_country.clone(),
            store_url,
        })
    }

    /// Validate the cart, build the payload and create the order.
    ///
    /// Validation failures return before any upstream call. Creation is a
    /// single upstream call and is never retried.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] for an empty cart, a zero quantity, a malformed
    /// customer email, or an upstream failure.
    #[instrument(skip_all, fields(items = items.len(), guest = tracing::field::Empty))]
    pub async fn create_order(
        &self,
        items: &[OrderItem],
        customer: Option<&CustomerInfo>,
        client: &ClientContext,
    ) -> Result<CreatedOrder, OrderError> {
        let line_items = line_items(items)?;

        let supplied_email = match customer {
            Some(c) => c.email().map_err(OrderError::InvalidCustomer)?,
            None => None,
        };
        let guest = supplied_email.is_none();
        tracing::Span::current().record("guest", guest);

        let email = match supplied_email {
            Some(email) => email,
            None => self.guest.next_email().map_err(|e| OrderError::Creation {
                status: None,
                cause: FailureCategory::Config,
                message: e.to_string(),
            })?,
        };

        let billing = complete_address(customer, &email, &self.default_country);
        let payload = OrderPayload {
            set_paid: false,
            status: "pending".to_string(),
            customer_id: 0,
            customer_ip_address: client.ip.clone(),
            customer_user_agent: client.user_agent.clone(),
            shipping: billing.clone(),
            billing,
            line_items,
            customer_note: customer
                .and_then(CustomerInfo::note)
                .unwrap_or(DEFAULT_ORDER_NOTE)
                .to_string(),
        };

        let count = payload.line_items.len().to_string();
        let guest_flag = if guest { "true" } else { "false" };
        add_breadcrumb(
            "checkout",
            "Submitting order",
            Some(&[("line_items", count.as_str()), ("guest", guest_flag)]),
        );

        let created = self.store.create_order(&payload).await.map_err(|e| {
            warn!(cause = %e.category(), error = %e, "Order creation failed");
            OrderError::from(e)
        })?;

        let payment_url = match created.payment_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url,
            None => payment_url(&self.store_url, created.id, &created.order_key),
        };

        info!(order_id = %created.id, "Order created");
        let order_id = created.id.to_string();
        add_breadcrumb("checkout", "Order created", Some(&[("order_id", order_id.as_str())]));

        Ok(CreatedOrder {
            order_id: created.id,
            order_key: created.order_key,
            payment_url,
        })
    }
}

/// Validate items and merge duplicate products, keeping first-seen order.
fn line_items(items: &[OrderItem]) -> Result<Vec<OrderLineItem>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut lines: Vec<OrderLineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::InvalidItem {
                product_id: item.product_id.as_i64(),
            });
        }
        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => lines.push(OrderLineItem {
                product_id: item.product_id,
                quantity: item.quantity,
            }),
        }
    }
    Ok(lines)
}

/// The store's pay-for-order page for an order.
#[must_use]
pub fn payment_url(store_url: &Url, order_id: OrderId, order_key: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("pay_for_order", "true")
        .append_pair("key", order_key)
        .finish();
    format!(
        "{}/checkout/order-pay/{order_id}/?{query}",
        store_url.as_str().trim_end_matches('/')
    )
}
