//! Order status lookups and result-view routing.
//!
//! A status read requires both the order id and its key. The key is compared
//! in constant time, and a mismatch reveals nothing about the order.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use ugames_core::{OrderId, OrderStatus, ProductId};

use crate::config::CheckoutConfig;
use crate::woocommerce::{RawOrder, StoreApi, StoreError};

/// Errors from [`OrderStatusTracker::get_order_status`].
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Order not found")]
    NotFound,

    #[error("Order key does not match")]
    Forbidden,

    #[error("Upstream error: {0}")]
    Upstream(#[source] StoreError),
}

/// Order fields that are safe to show the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total: String,
    pub currency: String,
    pub date: Option<String>,
    pub items: Vec<OrderLineView>,
    pub payment_method: String,
    pub customer_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub quantity: u32,
    pub total: String,
}

impl From<RawOrder> for OrderStatusView {
    fn from(order: RawOrder) -> Self {
        Self {
            order_id: order.id,
            status: OrderStatus::from_upstream(&order.status),
            total: order.total,
            currency: order.currency,
            date: order.date_created,
            items: order
                .line_items
                .into_iter()
                .map(|line| OrderLineView {
                    product_id: line.product_id,
                    name: line.name,
                    quantity: line.quantity,
                    total: line.total,
                })
                .collect(),
            payment_method: order.payment_method_title,
            customer_note: order.customer_note,
        }
    }
}

// =============================================================================
// Views
// =============================================================================

/// The result page an order belongs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderView {
    Success,
    /// Not settled yet; the page offers a manual re-check.
    Pending,
    Failure { reason: String },
}

impl OrderView {
    #[must_use]
    pub fn for_status(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Completed | OrderStatus::Processing => Self::Success,
            OrderStatus::Pending | OrderStatus::OnHold => Self::Pending,
            OrderStatus::Cancelled | OrderStatus::Failed | OrderStatus::Refunded => {
                Self::Failure {
                    reason: status.as_str().to_string(),
                }
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ViewKind {
        match self {
            Self::Success => ViewKind::Success,
            Self::Pending => ViewKind::Pending,
            Self::Failure { .. } => ViewKind::Failure,
        }
    }
}

/// Which result page the browser is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Success,
    Pending,
    Failure,
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "pending" => Ok(Self::Pending),
            "failure" | "failed" => Ok(Self::Failure),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// Whether the browser should move to another result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Stay,
    Redirect(String),
}

/// Paths of the three result pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPaths {
    pub success: String,
    pub pending: String,
    pub failure: String,
}

impl From<&CheckoutConfig> for ViewPaths {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            success: config.success_path.clone(),
            pending: config.pending_path.clone(),
            failure: config.failure_path.clone(),
        }
    }
}

impl ViewPaths {
    /// Result page URL for an order in the given view.
    #[must_use]
    pub fn url(&self, view: &OrderView, order_id: OrderId, order_key: &str) -> String {
        let path = match view {
            OrderView::Success => &self.success,
            OrderView::Pending => &self.pending,
            OrderView::Failure { .. } => &self.failure,
        };

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("order_id", &order_id.to_string())
            .append_pair("key", order_key);
        if let OrderView::Failure { reason } = view {
            query.append_pair("reason", reason);
        }

        format!("{path}?{}", query.finish())
    }
}

/// Decide where the browser belongs for an order in `status`.
///
/// Without a known current view the browser is always redirected.
#[must_use]
pub fn route(
    paths: &ViewPaths,
    status: OrderStatus,
    current_view: Option<ViewKind>,
    order_id: OrderId,
    order_key: &str,
) -> RedirectDecision {
    let target = OrderView::for_status(status);
    if current_view == Some(target.kind()) {
        RedirectDecision::Stay
    } else {
        RedirectDecision::Redirect(paths.url(&target, order_id, order_key))
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Reads order status on behalf of the shopper.
pub struct OrderStatusTracker {
    store: Arc<dyn StoreApi>,
    paths: ViewPaths,
}

impl OrderStatusTracker {
    #[must_use]
    pub fn new(store: Arc<dyn StoreApi>, paths: ViewPaths) -> Self {
        Self { store, paths }
    }

    #[must_use]
    pub const fn paths(&self) -> &ViewPaths {
        &self.paths
    }

    /// Status of an order, if `order_key` is its key.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Forbidden`] for an empty or mismatched key
    /// - [`TrackerError::NotFound`] when the order does not exist
    /// - [`TrackerError::Upstream`] when the store cannot be reached
    #[instrument(skip(self, order_key), fields(order_id = %order_id))]
    pub async fn get_order_status(
        &self,
        order_id: OrderId,
        order_key: &str,
    ) -> Result<OrderStatusView, TrackerError> {
        let order_key = order_key.trim();
        if order_key.is_empty() {
            debug!("Status request without an order key");
            return Err(TrackerError::Forbidden);
        }

        let order = match self.store.get_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => return Err(TrackerError::NotFound),
            Err(e) if e.is_not_found() => return Err(TrackerError::NotFound),
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Order status read failed");
                return Err(TrackerError::Upstream(e));
            }
        };

        if !keys_match(&order.order_key, order_key) {
            warn!("Order key mismatch");
            return Err(TrackerError::Forbidden);
        }

        let view = OrderStatusView::from(order);
        info!(status = %view.status, "Order status read");
        Ok(view)
    }

    /// [`route`] with the configured view paths.
    #[must_use]
    pub fn route(
        &self,
        status: OrderStatus,
        current_view: Option<ViewKind>,
        order_id: OrderId,
        order_key: &str,
    ) -> RedirectDecision {
        route(&self.paths, status, current_view, order_id, order_key)
    }
}

fn keys_match(stored: &str, supplied: &str) -> bool {
    !stored.is_empty() && bool::from(stored.as_bytes().ct_eq(supplied.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, raw_order};

    fn tracker(store: Arc<FakeStore>) -> OrderStatusTracker {
        OrderStatusTracker::new(store, ViewPaths::from(&CheckoutConfig::default()))
    }

    #[test]
    fn test_view_for_status() {
        assert_eq!(OrderView::for_status(OrderStatus::Processing), OrderView::Success);
        assert_eq!(OrderView::for_status(OrderStatus::Completed), OrderView::Success);
        assert_eq!(OrderView::for_status(OrderStatus::OnHold), OrderView::Pending);
        assert_eq!(OrderView::for_status(OrderStatus::Pending), OrderView::Pending);
        assert_eq!(
            OrderView::for_status(OrderStatus::Cancelled),
            OrderView::Failure {
                reason: "cancelled".to_string()
            }
        );
        assert_eq!(
            OrderView::for_status(OrderStatus::Refunded),
            OrderView::Failure {
                reason: "refunded".to_string()
            }
        );
    }

    #[test]
    fn test_route() {
        let paths = ViewPaths::from(&CheckoutConfig::default());
        let id = OrderId::new(881);

        assert_eq!(
            route(&paths, OrderStatus::Processing, Some(ViewKind::Pending), id, "wc_order_k"),
            RedirectDecision::Redirect("/order/success?order_id=881&key=wc_order_k".to_string())
        );
        assert_eq!(
            route(&paths, OrderStatus::OnHold, Some(ViewKind::Pending), id, "wc_order_k"),
            RedirectDecision::Stay
        );
        assert_eq!(
            route(&paths, OrderStatus::Failed, None, id, "wc_order_k"),
            RedirectDecision::Redirect(
                "/order/failed?order_id=881&key=wc_order_k&reason=failed".to_string()
            )
        );
    }

    #[test]
    fn test_view_kind_parse() {
        assert_eq!("success".parse::<ViewKind>(), Ok(ViewKind::Success));
        assert_eq!("Failed".parse::<ViewKind>(), Ok(ViewKind::Failure));
        assert!("cart".parse::<ViewKind>().is_err());
    }

    #[tokio::test]
    async fn processing_order_is_success() {
        let store = FakeStore::new();
        store.insert_order(raw_order(881, "wc_order_k", "processing"));
        let tracker = tracker(store);

        let view = tracker
            .get_order_status(OrderId::new(881), "wc_order_k")
            .await
            .unwrap();

        assert_eq!(view.status, OrderStatus::Processing);
        assert_eq!(OrderView::for_status(view.status), OrderView::Success);
        assert_eq!(view.items[0].name, "Hades");
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.payment_method, "Credit card");
    }

    #[tokio::test]
    async fn on_hold_order_is_pending() {
        let store = FakeStore::new();
        store.insert_order(raw_order(882, "wc_order_k", "wc-on-hold"));
        let tracker = tracker(store);

        let view = tracker
            .get_order_status(OrderId::new(882), "wc_order_k")
            .await
            .unwrap();

        assert_eq!(view.status, OrderStatus::OnHold);
        assert_eq!(OrderView::for_status(view.status), OrderView::Pending);
    }

    #[tokio::test]
    async fn wrong_or_empty_key_is_forbidden() {
        let store = FakeStore::new();
        store.insert_order(raw_order(881, "wc_order_k", "processing"));
        let tracker = tracker(store.clone());

        let err = tracker
            .get_order_status(OrderId::new(881), "wc_order_other")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden));

        let err = tracker
            .get_order_status(OrderId::new(881), "")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden));
        assert_eq!(store.order_reads(), 1);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let tracker = tracker(FakeStore::new());
        let err = tracker
            .get_order_status(OrderId::new(5), "wc_order_k")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound));
    }

    #[tokio::test]
    async fn upstream_failure_is_surfaced() {
        let store = FakeStore::new();
        store.fail_reads(StoreError::Timeout);
        let tracker = tracker(store);

        let err = tracker
            .get_order_status(OrderId::new(881), "wc_order_k")
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Upstream(StoreError::Timeout)));
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("wc_order_k", "wc_order_k"));
        assert!(!keys_match("wc_order_k", "wc_order_"));
        assert!(!keys_match("", ""));
    }
}
