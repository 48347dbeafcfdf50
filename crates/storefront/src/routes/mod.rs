//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (upstream store)
//!
//! # Orders
//! POST /api/create-order                - Create an order, returns the payment URL
//! GET  /api/order-status                - Order status by id and key
//!
//! # Catalog
//! GET  /api/products                    - Full published catalog
//! GET  /api/products/best-sellers       - Best sellers
//! GET  /api/products/{slug}             - Single product
//! GET  /api/categories                  - Category list
//! GET  /api/categories/{slug}/products  - Products in a category
//! ```

pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(orders::create_order))
        .route("/order-status", get(orders::order_status))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/best-sellers", get(products::best_sellers))
        .route("/products/{slug}", get(products::show))
        .route("/categories", get(products::categories))
        .route("/categories/{slug}/products", get(products::category_products))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", order_routes().merge(catalog_routes()))
}

/// The full application: routes, state and per-request middleware.
pub fn app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    routes()
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(trace)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the upstream store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.store_reachable().await {
        StatusCode::OK
    } else {
        tracing::warn!("Readiness check failed: store unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
        response::Response,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::testing::{FakeStore, test_state};
    use crate::woocommerce::StoreError;

    pub async fn send(state: AppState, request: Request<Body>) -> Response {
        app(state).oneshot(request).await.unwrap()
    }

    pub async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = send(test_state(FakeStore::new()), get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn readiness_follows_store() {
        let store = FakeStore::new();
        let state = test_state(store.clone());

        let response = send(state.clone(), get_request("/health/ready")).await;
        assert_eq!(response.status(), StatusCode::OK);

        store.fail_category_reads(StoreError::Timeout);
        let response = send(state, get_request("/health/ready")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = send(test_state(FakeStore::new()), get_request("/api/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
