//! Normalized catalog model.
//!
//! Raw upstream records are converted into these types by the storefront's
//! normalization layer; nothing downstream of it reads raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, StockStatus, discount_percent};

/// A taxonomy term attached to a product (category or tag).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRef {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
}

/// A product category as listed by the categories endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    /// Number of published products in the category, when reported.
    pub count: Option<u32>,
}

/// A product in its internal normalized form.
///
/// `slug` is the externally addressable key; `id` is the upstream identity
/// used for cart lines and order line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    /// Current selling price (decimal string, may be blank).
    pub price: String,
    pub regular_price: String,
    pub sale_price: String,
    pub on_sale: bool,
    /// Image URLs; the first one is the primary image.
    pub images: Vec<String>,
    pub categories: Vec<TermRef>,
    pub tags: Vec<TermRef>,
    pub stock_status: StockStatus,
    /// Lifetime units sold, used for best-seller ranking only.
    pub total_sales: u64,
    pub featured: bool,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

impl Product {
    /// The primary image URL, if the product has any images.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Price to show the shopper: the current price, or the regular price
    /// when the current one is blank.
    #[must_use]
    pub fn display_price(&self) -> &str {
        if self.price.trim().is_empty() {
            &self.regular_price
        } else {
            &self.price
        }
    }

    /// Struck-through "was" price, present only while the product is on sale.
    #[must_use]
    pub fn compare_at_price(&self) -> Option<&str> {
        (self.on_sale && !self.regular_price.trim().is_empty())
            .then_some(self.regular_price.as_str())
    }

    /// Rounded discount percentage while on sale, otherwise 0.
    #[must_use]
    pub fn discount_percent(&self) -> u32 {
        if self.on_sale {
            discount_percent(&self.regular_price, &self.sale_price)
        } else {
            0
        }
    }

    /// Whether the product belongs to the category with the given slug.
    #[must_use]
    pub fn in_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }
}
