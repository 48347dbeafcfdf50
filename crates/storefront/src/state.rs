//! Application state shared across handlers.

use std::sync::Arc;

use tracing::info;
use ugames_core::EmailError;

use crate::catalog::{CatalogResolver, GatewayError};
use crate::config::StorefrontConfig;
use crate::orders::{OrderOrchestrator, OrderStatusTracker, ViewPaths};
use crate::woocommerce::{CategoryQuery, StoreApi, StoreClient, StoreError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("store client: {0}")]
    Store(#[from] StoreError),
    #[error("cache gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("invalid GUEST_EMAIL_DOMAIN: {0}")]
    GuestDomain(#[from] EmailError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog resolver, the order services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn StoreApi>,
    catalog: CatalogResolver,
    orders: OrderOrchestrator,
    tracker: OrderStatusTracker,
}

impl AppState {
    /// Create the application state with live upstream clients.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the guest email
    /// domain is invalid.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let store: Arc<dyn StoreApi> =
            Arc::new(StoreClient::new(&config.woocommerce, &config.upstream)?);
        let catalog = CatalogResolver::from_config(&config, Arc::clone(&store))?;

        info!(
            strategies = ?catalog.strategy_names(),
            memo = catalog.has_memo(),
            "Catalog resolver configured"
        );

        Self::from_parts(config, store, catalog)
    }

    /// Assemble the state around an existing store and resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the guest email domain is invalid.
    pub fn from_parts(
        config: StorefrontConfig,
        store: Arc<dyn StoreApi>,
        catalog: CatalogResolver,
    ) -> Result<Self, StateError> {
        let orders = OrderOrchestrator::new(
            Arc::clone(&store),
            &config.checkout,
            config.woocommerce.store_url.clone(),
        )?;
        let tracker = OrderStatusTracker::new(Arc::clone(&store), ViewPaths::from(&config.checkout));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                catalog,
                orders,
                tracker,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogResolver {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderOrchestrator {
        &self.inner.orders
    }

    #[must_use]
    pub fn tracker(&self) -> &OrderStatusTracker {
        &self.inner.tracker
    }

    /// Whether the upstream store answers a minimal read.
    pub async fn store_reachable(&self) -> bool {
        let query = CategoryQuery {
            slug: None,
            per_page: Some(1),
        };
        self.inner.store.list_categories(&query).await.is_ok()
    }
}
