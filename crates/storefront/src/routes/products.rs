//! Catalog route handlers.
//!
//! Catalog reads never fail: an unreachable upstream yields an empty list.
//! Only a missing single product is an error.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use ugames_core::{Category, Product};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::woocommerce::MAX_PER_PAGE;

const DEFAULT_BEST_SELLERS: u32 = 12;
const DEFAULT_CATEGORY_PAGE: u32 = 24;

/// Page size query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageSizeQuery {
    pub per_page: Option<u32>,
}

impl PageSizeQuery {
    /// Requested size clamped to `1..=MAX_PER_PAGE`.
    fn resolve(&self, default: u32) -> u32 {
        self.per_page.unwrap_or(default).clamp(1, MAX_PER_PAGE)
    }
}

/// The full published catalog.
///
/// GET /api/products
pub async fn index(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.catalog().fetch_catalog().await)
}

/// A single product by slug.
///
/// GET /api/products/{slug}
///
/// # Errors
///
/// Returns 404 when no published product has this slug.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .fetch_by_slug(&slug)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))
}

/// Best sellers, most sold first.
///
/// GET /api/products/best-sellers?per_page=
pub async fn best_sellers(
    State(state): State<AppState>,
    Query(query): Query<PageSizeQuery>,
) -> Json<Vec<Product>> {
    let per_page = query.resolve(DEFAULT_BEST_SELLERS);
    Json(state.catalog().fetch_best_sellers(per_page).await)
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog().fetch_categories().await)
}

/// Products in a category; unknown categories give an empty list.
///
/// GET /api/categories/{slug}/products?per_page=
pub async fn category_products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageSizeQuery>,
) -> Json<Vec<Product>> {
    let per_page = query.resolve(DEFAULT_CATEGORY_PAGE);
    Json(state.catalog().fetch_by_category(&slug, per_page).await)
}
