//! Named catalog sources, tried in order by the resolver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, instrument, warn};

use super::gateway::CacheGateway;
use crate::woocommerce::{MAX_PER_PAGE, ProductQuery, StoreApi};

/// One way of obtaining the raw catalog.
///
/// `None` means "no answer, try the next strategy"; `Some` (even empty) is
/// final.
#[async_trait]
pub trait CatalogStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self) -> Option<Vec<Value>>;
}

// =============================================================================
// Cache gateway
// =============================================================================

/// Full catalog from the cache gateway in a single call.
pub struct GatewayStrategy {
    gateway: CacheGateway,
}

impl GatewayStrategy {
    #[must_use]
    pub const fn new(gateway: CacheGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CatalogStrategy for GatewayStrategy {
    fn name(&self) -> &'static str {
        "cache_gateway"
    }

    async fn attempt(&self) -> Option<Vec<Value>> {
        match self.gateway.fetch_products().await {
            Ok(snapshot) if !snapshot.products.is_empty() || snapshot.warm => {
                Some(snapshot.products)
            }
            Ok(_) => {
                debug!("Cache gateway returned an empty cold snapshot");
                None
            }
            Err(e) => {
                warn!(cause = %e.category(), error = %e, "Cache gateway unavailable");
                None
            }
        }
    }
}

// =============================================================================
// Paginated store fetch
// =============================================================================

const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Walks `GET /products` page by page until a short page, bounded by a page
/// ceiling and an overall deadline.
pub struct PaginatedStoreStrategy {
    store: Arc<dyn StoreApi>,
    per_page: u32,
    max_pages: u32,
    deadline: Duration,
}

impl PaginatedStoreStrategy {
    #[must_use]
    pub fn new(store: Arc<dyn StoreApi>, max_pages: u32) -> Self {
        Self {
            store,
            per_page: MAX_PER_PAGE,
            max_pages: max_pages.max(1),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Time budget for the whole walk. Pages fetched before it runs out are
    /// kept.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl CatalogStrategy for PaginatedStoreStrategy {
    fn name(&self) -> &'static str {
        "store_paginated"
    }

    #[instrument(
        skip(self),
        fields(per_page = self.per_page, max_pages = self.max_pages, deadline = ?self.deadline)
    )]
    async fn attempt(&self) -> Option<Vec<Value>> {
        let deadline = Instant::now() + self.deadline;
        let mut records = Vec::new();

        for page in 1..=self.max_pages {
            let query = ProductQuery::page(page, self.per_page);
            let Ok(result) = timeout_at(deadline, self.store.list_products(&query)).await else {
                if page == 1 {
                    warn!("Store catalog fetch ran out of time on the first page");
                    return None;
                }
                warn!(
                    page,
                    kept = records.len(),
                    "Store catalog deadline reached, keeping earlier pages"
                );
                return Some(records);
            };

            match result {
                Ok(batch) => {
                    let short = batch.len() < self.per_page as usize;
                    debug!(page, count = batch.len(), "Fetched catalog page");
                    records.extend(batch);
                    if short {
                        return Some(records);
                    }
                }
                Err(e) if page == 1 => {
                    warn!(page, cause = %e.category(), error = %e, "Store catalog fetch failed");
                    return None;
                }
                Err(e) => {
                    warn!(
                        page,
                        cause = %e.category(),
                        error = %e,
                        kept = records.len(),
                        "Store catalog fetch failed mid-way, keeping earlier pages"
                    );
                    return Some(records);
                }
            }
        }

        warn!(
            max_pages = self.max_pages,
            count = records.len(),
            "Catalog page ceiling reached"
        );
        Some(records)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeStore;
    use crate::woocommerce::StoreError;

    fn records(start: usize, n: usize) -> Vec<Value> {
        (start..start + n)
            .map(|i| json!({"id": i + 1, "slug": format!("game-{}", i + 1)}))
            .collect()
    }

    #[tokio::test]
    async fn stops_at_short_page() {
        let store = FakeStore::with_pages(vec![
            Ok(records(0, 100)),
            Ok(records(100, 100)),
            Ok(records(200, 7)),
        ]);
        let strategy = PaginatedStoreStrategy::new(store.clone(), 200);

        let result = strategy.attempt().await.unwrap();

        assert_eq!(result.len(), 207);
        assert_eq!(store.product_calls(), 3);
        assert_eq!(store.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn always_full_pages_stop_at_ceiling() {
        let store = FakeStore::always_full();
        let strategy = PaginatedStoreStrategy::new(store.clone(), 5);

        let result = strategy.attempt().await.unwrap();

        assert_eq!(store.product_calls(), 5);
        assert_eq!(result.len(), 500);
    }

    #[tokio::test]
    async fn first_page_failure_yields_none() {
        let store = FakeStore::with_pages(vec![Err(StoreError::Timeout)]);
        let strategy = PaginatedStoreStrategy::new(store.clone(), 10);

        assert!(strategy.attempt().await.is_none());
        assert_eq!(store.product_calls(), 1);
    }

    #[tokio::test]
    async fn later_failure_keeps_earlier_pages() {
        let store = FakeStore::with_pages(vec![Ok(records(0, 100)), Err(StoreError::Timeout)]);
        let strategy = PaginatedStoreStrategy::new(store, 10);

        assert_eq!(strategy.attempt().await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn deadline_keeps_pages_fetched_in_time() {
        let store = FakeStore::always_full();
        store.delay_pages(Duration::from_millis(30));
        let strategy = PaginatedStoreStrategy::new(store.clone(), 200)
            .with_deadline(Duration::from_millis(100));

        let result = strategy.attempt().await.unwrap();

        assert!(!result.is_empty());
        assert_eq!(result.len() % 100, 0);
        assert!(store.product_calls() < 200);
        assert_eq!(result.len(), (store.product_calls() - 1) * 100);
    }

    #[tokio::test]
    async fn deadline_on_first_page_yields_none() {
        let store = FakeStore::always_full();
        store.delay_pages(Duration::from_millis(200));
        let strategy =
            PaginatedStoreStrategy::new(store.clone(), 10).with_deadline(Duration::from_millis(20));

        assert!(strategy.attempt().await.is_none());
        assert_eq!(store.product_calls(), 1);
    }
}
