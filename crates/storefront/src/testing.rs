//! In-memory [`StoreApi`] fake with call counters, shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use ugames_core::{OrderId, ProductId};

use crate::catalog::{CatalogResolver, CatalogStrategy, PaginatedStoreStrategy};
use crate::config::StorefrontConfig;
use crate::state::AppState;
use crate::woocommerce::{
    CategoryQuery, CreatedOrderResponse, OrderPayload, ProductQuery, RawOrder, RawOrderLine,
    StoreApi, StoreError,
};

pub const STORE_URL: &str = "https://shop.ugames.test";

#[derive(Default)]
pub struct FakeStore {
    pages: Mutex<VecDeque<Result<Vec<Value>, StoreError>>>,
    always_full: bool,
    page_delay: Mutex<Option<Duration>>,
    product_queries: Mutex<Vec<ProductQuery>>,
    categories: Mutex<Vec<Value>>,
    category_error: Mutex<Option<StoreError>>,
    category_lookup: Mutex<Option<Vec<Value>>>,
    category_queries: Mutex<Vec<CategoryQuery>>,
    created: Mutex<Vec<OrderPayload>>,
    create_error: Mutex<Option<StoreError>>,
    omit_payment_url: AtomicBool,
    next_order_id: AtomicI64,
    orders: Mutex<HashMap<OrderId, RawOrder>>,
    read_error: Mutex<Option<StoreError>>,
    order_reads: Mutex<usize>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_order_id: AtomicI64::new(1000),
            ..Self::default()
        })
    }

    /// Product listing answers consumed in order; an exhausted script
    /// answers with an empty page.
    pub fn with_pages(pages: Vec<Result<Vec<Value>, StoreError>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            next_order_id: AtomicI64::new(1000),
            ..Self::default()
        })
    }

    /// Every product listing returns a full page of distinct records.
    pub fn always_full() -> Arc<Self> {
        Arc::new(Self {
            always_full: true,
            next_order_id: AtomicI64::new(1000),
            ..Self::default()
        })
    }

    /// Every product listing takes this long to answer.
    pub fn delay_pages(&self, delay: Duration) {
        *self.page_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_categories(&self, categories: Vec<Value>) {
        *self.categories.lock().unwrap() = categories;
    }

    /// Fixed answer for slug lookups, as if the upstream had filtered it.
    pub fn answer_category_lookups(&self, records: Vec<Value>) {
        *self.category_lookup.lock().unwrap() = Some(records);
    }

    pub fn fail_category_reads(&self, err: StoreError) {
        *self.category_error.lock().unwrap() = Some(err);
    }

    pub fn fail_create(&self, err: StoreError) {
        *self.create_error.lock().unwrap() = Some(err);
    }

    pub fn omit_payment_url(&self) {
        self.omit_payment_url.store(true, Ordering::SeqCst);
    }

    pub fn insert_order(&self, order: RawOrder) {
        self.orders.lock().unwrap().insert(order.id, order);
    }

    pub fn fail_reads(&self, err: StoreError) {
        *self.read_error.lock().unwrap() = Some(err);
    }

    pub fn product_calls(&self) -> usize {
        self.product_queries.lock().unwrap().len()
    }

    pub fn product_queries(&self) -> Vec<ProductQuery> {
        self.product_queries.lock().unwrap().clone()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.product_queries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|q| q.page)
            .collect()
    }

    pub fn category_calls(&self) -> usize {
        self.category_queries.lock().unwrap().len()
    }

    pub fn created_orders(&self) -> Vec<OrderPayload> {
        self.created.lock().unwrap().clone()
    }

    pub fn order_reads(&self) -> usize {
        *self.order_reads.lock().unwrap()
    }

    /// Total number of upstream calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.product_calls()
            + self.category_calls()
            + self.created.lock().unwrap().len()
            + self.order_reads()
    }
}

#[async_trait]
impl StoreApi for FakeStore {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Value>, StoreError> {
        let call = {
            let mut queries = self.product_queries.lock().unwrap();
            queries.push(query.clone());
            queries.len()
        };

        let delay = *self.page_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.always_full {
            let per_page = query.per_page.unwrap_or(10) as usize;
            let offset = (call - 1) * per_page;
            return Ok((offset..offset + per_page)
                .map(|i| json!({"id": i + 1, "slug": format!("game-{}", i + 1)}))
                .collect());
        }

        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_categories(&self, query: &CategoryQuery) -> Result<Vec<Value>, StoreError> {
        self.category_queries.lock().unwrap().push(query.clone());
        if let Some(err) = self.category_error.lock().unwrap().take() {
            return Err(err);
        }
        if query.slug.is_some()
            && let Some(records) = self.category_lookup.lock().unwrap().clone()
        {
            return Ok(records);
        }
        let categories = self.categories.lock().unwrap().clone();
        Ok(match &query.slug {
            Some(slug) => categories
                .into_iter()
                .filter(|c| c["slug"] == slug.as_str())
                .collect(),
            None => categories,
        })
    }

    async fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> Result<CreatedOrderResponse, StoreError> {
        self.created.lock().unwrap().push(payload.clone());
        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order_key = format!("wc_order_{id}");
        let payment_url = (!self.omit_payment_url.load(Ordering::SeqCst)).then(|| {
            format!("{STORE_URL}/checkout/order-pay/{id}/?pay_for_order=true&key={order_key}")
        });

        Ok(CreatedOrderResponse {
            id: OrderId::new(id),
            order_key,
            payment_url,
            status: Some("pending".to_string()),
        })
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<RawOrder>, StoreError> {
        *self.order_reads.lock().unwrap() += 1;
        if let Some(err) = self.read_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.orders.lock().unwrap().get(&order_id).cloned())
    }
}

/// A stored order in the given upstream status.
pub fn raw_order(id: i64, key: &str, status: &str) -> RawOrder {
    RawOrder {
        id: OrderId::new(id),
        order_key: key.to_string(),
        status: status.to_string(),
        total: "299.80".to_string(),
        currency: "TRY".to_string(),
        date_created: Some("2026-03-01T10:00:00".to_string()),
        line_items: vec![RawOrderLine {
            product_id: Some(ProductId::new(42)),
            name: "Hades".to_string(),
            quantity: 2,
            total: "299.80".to_string(),
        }],
        payment_method_title: "Credit card".to_string(),
        customer_note: String::new(),
    }
}

/// Configuration with the required variables plus `overrides`.
pub fn test_config(overrides: &[(&str, &str)]) -> StorefrontConfig {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("WOOCOMMERCE_URL", STORE_URL),
        ("WOOCOMMERCE_KEY", "ck_9f2c41d7a0b85e63f1c4d92ab07e5c3816f4a9d2"),
        ("WOOCOMMERCE_SECRET", "cs_4e81b0c93fa27d6e5b1c08f4a3d92e7b6c15f0a8"),
    ]);
    vars.extend(overrides.iter().copied());
    StorefrontConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap()
}

/// Application state over `store`, resolving the catalog by paginating it.
pub fn test_state(store: Arc<FakeStore>) -> AppState {
    let strategies: Vec<Box<dyn CatalogStrategy>> =
        vec![Box::new(PaginatedStoreStrategy::new(store.clone(), 5))];
    let catalog = CatalogResolver::new(store.clone(), strategies, None);
    AppState::from_parts(test_config(&[]), store, catalog).unwrap()
}
