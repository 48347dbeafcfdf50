//! Upstream store REST API client.
//!
//! # Architecture
//!
//! - `reqwest` with server-held consumer credentials (HTTP basic auth)
//! - The upstream store is the source of truth - NO local sync, direct API calls
//! - Every call has a finite timeout; idempotent reads retry transient
//!   failures a bounded number of times, order creation never retries
//! - [`StoreApi`] is the seam the catalog resolver and the order services
//!   depend on, so they can run against fakes in tests
//!
//! # Example
//!
//! ```rust,ignore
//! use ugames_storefront::woocommerce::{ProductQuery, StoreApi, StoreClient};
//!
//! let client = StoreClient::new(&config.woocommerce, &config.upstream)?;
//! let page = client.list_products(&ProductQuery::page(1, 100)).await?;
//! ```

mod client;
pub mod conversions;
pub mod types;

pub use client::StoreClient;
pub use conversions::{NormalizationError, normalize_categories, normalize_product, normalize_products};
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use ugames_core::{CategoryId, OrderId};

/// Maximum page size the upstream accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Errors that can occur when talking to the upstream store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The call did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The upstream answered with a non-success status.
    #[error("Upstream returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client could not be constructed.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Coarse failure cause, used as a structured logging field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Network,
    Timeout,
    Parse,
    Upstream4xx,
    Upstream5xx,
    NotFound,
    Config,
}

impl FailureCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::Upstream4xx => "upstream_4xx",
            Self::Upstream5xx => "upstream_5xx",
            Self::NotFound => "not_found",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StoreError {
    /// Failure cause for logging.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::Http(_) => FailureCategory::Network,
            Self::Timeout => FailureCategory::Timeout,
            Self::Parse(_) => FailureCategory::Parse,
            Self::Status { status, .. } if *status >= 500 => FailureCategory::Upstream5xx,
            Self::Status { .. } => FailureCategory::Upstream4xx,
            Self::NotFound(_) => FailureCategory::NotFound,
            Self::Config(_) => FailureCategory::Config,
        }
    }

    /// Whether retrying the same idempotent request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Parse(_) | Self::NotFound(_) | Self::Config(_) => false,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    /// Best sellers first.
    Popularity,
}

/// Query for `GET /products`. Listing queries are always restricted to
/// published products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub slug: Option<String>,
    pub category: Option<CategoryId>,
    pub order_by: Option<ProductOrder>,
}

impl ProductQuery {
    /// One page of the full catalog.
    #[must_use]
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            ..Self::default()
        }
    }

    /// Single-product lookup by slug.
    #[must_use]
    pub fn by_slug(slug: &str) -> Self {
        Self {
            slug: Some(slug.to_string()),
            ..Self::default()
        }
    }

    /// Products in one category.
    #[must_use]
    pub fn in_category(category: CategoryId, per_page: u32) -> Self {
        Self {
            category: Some(category),
            per_page: Some(per_page),
            ..Self::default()
        }
    }

    /// Most popular products first.
    #[must_use]
    pub fn best_sellers(per_page: u32) -> Self {
        Self {
            per_page: Some(per_page),
            order_by: Some(ProductOrder::Popularity),
            ..Self::default()
        }
    }

    /// Query string parameters, with `per_page` clamped to the upstream maximum.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("status", "publish".to_string())];
        if let Some(page) = self.page {
            params.push(("page", page.max(1).to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()));
        }
        if let Some(slug) = &self.slug {
            params.push(("slug", slug.clone()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        match self.order_by {
            Some(ProductOrder::Popularity) => {
                params.push(("orderby", "popularity".to_string()));
                params.push(("order", "desc".to_string()));
            }
            None => {}
        }
        params
    }
}

/// Query for `GET /products/categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryQuery {
    pub slug: Option<String>,
    pub per_page: Option<u32>,
}

impl CategoryQuery {
    #[must_use]
    pub fn by_slug(slug: &str) -> Self {
        Self {
            slug: Some(slug.to_string()),
            per_page: None,
        }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            slug: None,
            per_page: Some(MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(slug) = &self.slug {
            params.push(("slug", slug.clone()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()));
        }
        params
    }
}

/// Operations the storefront needs from the upstream store.
///
/// Listing calls return raw JSON records; normalization happens in
/// [`conversions`] so a single malformed record never fails a whole page.
#[async_trait]
pub trait StoreApi: Send + Sync {
    /// `GET /products`.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Value>, StoreError>;

    /// `GET /products/categories`.
    async fn list_categories(&self, query: &CategoryQuery) -> Result<Vec<Value>, StoreError>;

    /// `POST /orders`. Never retried.
    async fn create_order(&self, payload: &OrderPayload)
    -> Result<CreatedOrderResponse, StoreError>;

    /// `GET /orders/{id}`; `Ok(None)` when the order does not exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<RawOrder>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("order 12".to_string());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = StoreError::Status {
            status: 400,
            code: Some("woocommerce_rest_invalid_product_id".to_string()),
            message: "Invalid product ID.".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 400: Invalid product ID.");
    }

    #[test]
    fn test_categories_and_transience() {
        let server = StoreError::Status {
            status: 503,
            code: None,
            message: String::new(),
        };
        assert_eq!(server.category(), FailureCategory::Upstream5xx);
        assert!(server.is_transient());

        let client = StoreError::Status {
            status: 400,
            code: None,
            message: String::new(),
        };
        assert_eq!(client.category(), FailureCategory::Upstream4xx);
        assert!(!client.is_transient());

        let throttled = StoreError::Status {
            status: 429,
            code: None,
            message: String::new(),
        };
        assert!(throttled.is_transient());

        assert!(StoreError::Timeout.is_transient());
        assert_eq!(StoreError::Timeout.category().to_string(), "timeout");
        assert!(!StoreError::NotFound(String::new()).is_transient());
    }

    #[test]
    fn test_product_query_params() {
        let params = ProductQuery::page(3, 500).to_params();
        assert_eq!(
            params,
            vec![
                ("status", "publish".to_string()),
                ("page", "3".to_string()),
                ("per_page", "100".to_string()),
            ]
        );

        let params = ProductQuery::best_sellers(12).to_params();
        assert!(params.contains(&("orderby", "popularity".to_string())));
        assert!(params.contains(&("order", "desc".to_string())));
        assert!(params.contains(&("per_page", "12".to_string())));

        let params = ProductQuery::in_category(CategoryId::new(15), 20).to_params();
        assert!(params.contains(&("category", "15".to_string())));

        let params = ProductQuery::by_slug("hades").to_params();
        assert!(params.contains(&("slug", "hades".to_string())));
    }

    #[test]
    fn test_category_query_params() {
        assert_eq!(
            CategoryQuery::by_slug("rpg").to_params(),
            vec![("slug", "rpg".to_string())]
        );
        assert_eq!(
            CategoryQuery::all().to_params(),
            vec![("per_page", "100".to_string())]
        );
    }
}
