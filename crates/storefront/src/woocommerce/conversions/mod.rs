//! Conversion from raw upstream JSON to the normalized catalog model.
//!
//! Records reach the storefront from two sources with different shapes: the
//! store API (snake_case, `images[].src`, `instock`) and the cache gateway,
//! which may already serve a reshaped record (camelCase, plain image URLs,
//! `in_stock`). Both are accepted here.

mod products;

pub use products::{NormalizationError, normalize_categories, normalize_product, normalize_products};
