//! Product and category normalization.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use ugames_core::{Category, CategoryId, Product, ProductId, StockStatus, TermRef};

type Object = Map<String, Value>;

/// Why a single raw record was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no usable id (slug: {slug:?})")]
    MissingId { slug: Option<String> },
    #[error("product {id} has no slug")]
    MissingSlug { id: i64 },
}

/// Normalize one raw product record.
///
/// # Errors
///
/// Returns a [`NormalizationError`] when the record is not an object or lacks
/// a positive id or a non-empty slug. Every other field degrades to a
/// default instead of failing.
pub fn normalize_product(record: &Value) -> Result<Product, NormalizationError> {
    let obj = record.as_object().ok_or(NormalizationError::NotAnObject)?;

    let slug = first_text(obj, &["slug"]).filter(|s| !s.trim().is_empty());
    let id = obj
        .get("id")
        .and_then(positive_id)
        .ok_or_else(|| NormalizationError::MissingId { slug: slug.clone() })?;
    let slug = slug.ok_or(NormalizationError::MissingSlug { id })?;

    Ok(Product {
        id: ProductId::new(id),
        slug: slug.trim().to_string(),
        name: first_text(obj, &["name", "title"]).unwrap_or_default(),
        price: first_text(obj, &["price"]).unwrap_or_default(),
        regular_price: first_text(obj, &["regular_price", "regularPrice"]).unwrap_or_default(),
        sale_price: first_text(obj, &["sale_price", "salePrice"]).unwrap_or_default(),
        on_sale: first_flag(obj, &["on_sale", "onSale"]),
        images: images(obj),
        categories: terms(obj.get("categories")),
        tags: terms(obj.get("tags")),
        stock_status: StockStatus::from_upstream(
            first_text(obj, &["stock_status", "stockStatus"]).as_deref(),
        ),
        total_sales: first_count(obj, &["total_sales", "totalSales"]),
        featured: first_flag(obj, &["featured"]),
        date_created: first_timestamp(obj, &["date_created_gmt", "date_created", "dateCreated"]),
        date_modified: first_timestamp(
            obj,
            &["date_modified_gmt", "date_modified", "dateModified"],
        ),
    })
}

/// Normalize a batch of records, dropping the invalid ones.
///
/// Duplicate ids or slugs (possible when the catalog changes between page
/// requests) keep their first occurrence.
#[must_use]
pub fn normalize_products(records: &[Value]) -> Vec<Product> {
    let mut seen_ids = HashSet::new();
    let mut seen_slugs = HashSet::new();
    let mut products = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match normalize_product(record) {
            Ok(product) => {
                if seen_ids.insert(product.id) && seen_slugs.insert(product.slug.clone()) {
                    products.push(product);
                } else {
                    debug!(id = %product.id, slug = %product.slug, "Dropping duplicate catalog record");
                }
            }
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "Dropping malformed catalog record");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = products.len(), "Dropped malformed catalog records");
    }

    products
}

/// Normalize raw category records; invalid ones are dropped.
#[must_use]
pub fn normalize_categories(records: &[Value]) -> Vec<Category> {
    records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let term = term(obj)?;
            Some(Category {
                id: term.id,
                slug: term.slug,
                name: term.name,
                count: obj
                    .get("count")
                    .and_then(count)
                    .and_then(|c| u32::try_from(c).ok()),
            })
        })
        .collect()
}

// =============================================================================
// Field helpers
// =============================================================================

fn positive_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

/// String or number rendered as a string. Numbers keep their JSON rendering,
/// so a numeric price never goes through a float format.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(obj: &Object, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(text))
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_i64() == Some(1)),
        Value::String(s) => Some(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        )),
        _ => None,
    }
}

fn first_flag(obj: &Object, keys: &[&str]) -> bool {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(flag))
        .unwrap_or(false)
}

fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn first_count(obj: &Object, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(count))
        .unwrap_or(0)
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Store timestamps carry no offset; the `_gmt` variants are UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn first_timestamp(obj: &Object, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|k| obj.get(*k).and_then(timestamp))
}

/// Image URLs in upstream order. Accepts `[{"src": ..}]`, `[{"url": ..}]`,
/// plain URL strings, or a single `image` field.
fn images(obj: &Object) -> Vec<String> {
    let listed: Vec<String> = obj
        .get("images")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(url) => Some(url.clone()),
                    Value::Object(img) => first_text(img, &["src", "url"]),
                    _ => None,
                })
                .filter(|url| !url.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !listed.is_empty() {
        return listed;
    }

    first_text(obj, &["image"])
        .filter(|url| !url.trim().is_empty())
        .into_iter()
        .collect()
}

fn term(obj: &Object) -> Option<TermRef> {
    let id = obj.get("id").and_then(positive_id)?;
    let slug = first_text(obj, &["slug"]).filter(|s| !s.trim().is_empty())?;
    let name = first_text(obj, &["name"]).unwrap_or_else(|| slug.clone());
    Some(TermRef {
        id: CategoryId::new(id),
        slug,
        name,
    })
}

fn terms(value: Option<&Value>) -> Vec<TermRef> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(term)
                .collect()
        })
        .unwrap_or_default()
}
