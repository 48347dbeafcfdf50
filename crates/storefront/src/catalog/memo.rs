//! Development-only catalog memo.
//!
//! A single global slot holding the last normalized catalog, so repeated page
//! loads during local development do not re-walk every upstream page. It is
//! constructed only when `APP_ENV=development`; production wiring passes
//! `None` to the resolver.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use ugames_core::Product;

/// Key of the only slot.
const ALL_PRODUCTS: &str = "all-products";

/// In-process memo of the full catalog with a fixed time-to-live.
#[derive(Clone)]
pub struct CatalogMemo {
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl CatalogMemo {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// The memoized catalog, if present and not expired.
    pub async fn get(&self) -> Option<Arc<Vec<Product>>> {
        self.cache.get(&ALL_PRODUCTS).await
    }

    pub async fn put(&self, products: Vec<Product>) {
        self.cache.insert(ALL_PRODUCTS, Arc::new(products)).await;
    }

    /// Drop the memoized catalog.
    pub async fn clear(&self) {
        self.cache.invalidate(&ALL_PRODUCTS).await;
    }
}

impl std::fmt::Debug for CatalogMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMemo")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
