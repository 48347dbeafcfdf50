//! Catalog resolution.
//!
//! The resolver answers every catalog read with a (possibly empty) list and
//! never surfaces an error to its callers. The full catalog comes from an
//! ordered chain of [`CatalogStrategy`]s:
//!
//! 1. the cache gateway (one call for everything)
//! 2. the paginated store fetch, unless the storefront runs cache-only
//!
//! Single-product, category and best-seller reads go straight to the store.

mod gateway;
mod memo;
mod strategy;

pub use gateway::{CacheGateway, GatewayError, GatewaySnapshot};
pub use memo::CatalogMemo;
pub use strategy::{CatalogStrategy, GatewayStrategy, PaginatedStoreStrategy};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use ugames_core::{Category, Product};

use crate::config::StorefrontConfig;
use crate::woocommerce::{
    CategoryQuery, ProductQuery, StoreApi, normalize_categories, normalize_products,
};

/// Resolves catalog reads against the gateway and the upstream store.
pub struct CatalogResolver {
    store: Arc<dyn StoreApi>,
    strategies: Vec<Box<dyn CatalogStrategy>>,
    memo: Option<CatalogMemo>,
}

impl CatalogResolver {
    #[must_use]
    pub fn new(
        store: Arc<dyn StoreApi>,
        strategies: Vec<Box<dyn CatalogStrategy>>,
        memo: Option<CatalogMemo>,
    ) -> Self {
        Self {
            store,
            strategies,
            memo,
        }
    }

    /// Wire the strategy chain and the memo from configuration.
    ///
    /// Cache-only mode leaves the store strategy out of the chain entirely.
    /// The memo exists only in development.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway client cannot be built.
    pub fn from_config(
        config: &StorefrontConfig,
        store: Arc<dyn StoreApi>,
    ) -> Result<Self, GatewayError> {
        let gateway = CacheGateway::new(&config.backend_url, &config.upstream)?;

        let mut strategies: Vec<Box<dyn CatalogStrategy>> =
            vec![Box::new(GatewayStrategy::new(gateway))];
        if !config.catalog.cache_only {
            strategies.push(Box::new(
                PaginatedStoreStrategy::new(Arc::clone(&store), config.catalog.max_pages)
                    .with_deadline(config.catalog.deadline),
            ));
        }

        let memo = config
            .environment
            .is_development()
            .then(|| CatalogMemo::new(config.catalog.memo_ttl));

        Ok(Self::new(store, strategies, memo))
    }

    /// Names of the configured strategies, in the order they are tried.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub const fn has_memo(&self) -> bool {
        self.memo.is_some()
    }

    /// The full published catalog; empty when every strategy fails.
    #[instrument(skip(self))]
    pub async fn fetch_catalog(&self) -> Vec<Product> {
        if let Some(memo) = &self.memo
            && let Some(cached) = memo.get().await
        {
            debug!(count = cached.len(), "Serving catalog from memo");
            return cached.as_ref().clone();
        }

        for strategy in &self.strategies {
            let Some(records) = strategy.attempt().await else {
                debug!(strategy = strategy.name(), "Strategy gave no answer");
                continue;
            };

            let products = normalize_products(&records);
            info!(
                strategy = strategy.name(),
                records = records.len(),
                count = products.len(),
                "Catalog resolved"
            );

            if let Some(memo) = &self.memo {
                memo.put(products.clone()).await;
            }
            return products;
        }

        warn!(
            strategies = ?self.strategy_names(),
            "No catalog strategy succeeded, serving an empty catalog"
        );
        Vec::new()
    }

    /// One product by slug, read directly from the store.
    #[instrument(skip(self))]
    pub async fn fetch_by_slug(&self, slug: &str) -> Option<Product> {
        let slug = slug.trim();
        if slug.is_empty() {
            return None;
        }

        // The upstream filters by slug and may return it percent-encoded
        match self.store.list_products(&ProductQuery::by_slug(slug)).await {
            Ok(records) => normalize_products(&records).into_iter().next(),
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Product lookup failed");
                None
            }
        }
    }

    /// Products in the category with the given slug.
    #[instrument(skip(self))]
    pub async fn fetch_by_category(&self, slug: &str, per_page: u32) -> Vec<Product> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Vec::new();
        }

        let category = match self.store.list_categories(&CategoryQuery::by_slug(slug)).await {
            Ok(records) => normalize_categories(&records).into_iter().next(),
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Category lookup failed");
                return Vec::new();
            }
        };

        let Some(category) = category else {
            debug!("Unknown category");
            return Vec::new();
        };

        match self
            .store
            .list_products(&ProductQuery::in_category(category.id, per_page))
            .await
        {
            Ok(records) => normalize_products(&records),
            Err(e) => {
                warn!(
                    category_id = %category.id,
                    cause = %e.category(),
                    error = %e,
                    "Category listing failed"
                );
                Vec::new()
            }
        }
    }

    /// Most popular products first.
    #[instrument(skip(self))]
    pub async fn fetch_best_sellers(&self, per_page: u32) -> Vec<Product> {
        match self
            .store
            .list_products(&ProductQuery::best_sellers(per_page))
            .await
        {
            Ok(records) => normalize_products(&records),
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Best seller listing failed");
                Vec::new()
            }
        }
    }

    /// Every product category.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Vec<Category> {
        match self.store.list_categories(&CategoryQuery::all()).await {
            Ok(records) => normalize_categories(&records),
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Category listing failed");
                Vec::new()
            }
        }
    }
}
