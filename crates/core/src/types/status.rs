//! Status enums for catalog and order entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// A closed vocabulary: every status string the upstream store reports is
/// mapped into one of these values by [`OrderStatus::from_upstream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Created, awaiting payment. Every new order starts here.
    #[default]
    Pending,
    /// Payment received but awaiting confirmation.
    OnHold,
    /// Paid; digital delivery in progress.
    Processing,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// Map an upstream status string into the closed vocabulary.
    ///
    /// Matching ignores case and a leading `wc-` prefix. Draft checkouts and
    /// values outside the vocabulary are treated as `Pending`, which keeps the
    /// shopper on the pending view with a manual re-check.
    #[must_use]
    pub fn from_upstream(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        let value = normalized.strip_prefix("wc-").unwrap_or(&normalized);

        match value {
            "on-hold" | "on_hold" => Self::OnHold,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            "refunded" => Self::Refunded,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Wire representation (`on-hold`, `processing`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnHold => "on-hold",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// No further transition is expected once an order reaches one of these.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Refunded | Self::Failed
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    /// Map the upstream stock vocabulary (`instock`, `outofstock`,
    /// `onbackorder`) into [`StockStatus`].
    ///
    /// A missing value means the store does not track stock for the product,
    /// so it is sellable. An unrecognized value is treated as out of stock.
    #[must_use]
    pub fn from_upstream(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::InStock;
        };

        match raw.trim().to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "instock" | "" => Self::InStock,
            "onbackorder" => Self::OnBackorder,
            _ => Self::OutOfStock,
        }
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_from_upstream() {
        assert_eq!(OrderStatus::from_upstream("pending"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_upstream("on-hold"), OrderStatus::OnHold);
        assert_eq!(OrderStatus::from_upstream("wc-processing"), OrderStatus::Processing);
        assert_eq!(OrderStatus::from_upstream("COMPLETED"), OrderStatus::Completed);
        assert_eq!(OrderStatus::from_upstream("canceled"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::from_upstream("refunded"), OrderStatus::Refunded);
        assert_eq!(OrderStatus::from_upstream("failed"), OrderStatus::Failed);
    }

    #[test]
    fn test_unknown_status_maps_to_pending() {
        assert_eq!(OrderStatus::from_upstream("checkout-draft"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_upstream("trash"), OrderStatus::Pending);
        assert_eq!(OrderStatus::from_upstream(""), OrderStatus::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::OnHold.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn test_order_status_serde_matches_as_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::OnHold,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
            OrderStatus::Failed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_stock_status_from_upstream() {
        assert_eq!(StockStatus::from_upstream(Some("instock")), StockStatus::InStock);
        assert_eq!(StockStatus::from_upstream(Some("outofstock")), StockStatus::OutOfStock);
        assert_eq!(StockStatus::from_upstream(Some("onbackorder")), StockStatus::OnBackorder);
        assert_eq!(StockStatus::from_upstream(Some("in_stock")), StockStatus::InStock);
        assert_eq!(StockStatus::from_upstream(None), StockStatus::InStock);
        assert_eq!(StockStatus::from_upstream(Some("discontinued")), StockStatus::OutOfStock);
    }

    #[test]
    fn test_stock_status_serializes_snake_case() {
        let json = serde_json::to_string(&StockStatus::OnBackorder).unwrap();
        assert_eq!(json, "\"on_backorder\"");
    }
}
