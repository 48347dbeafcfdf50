//! `reqwest` implementation of [`StoreApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use ugames_core::OrderId;
use url::Url;

use crate::config::{UpstreamConfig, WooCommerceConfig};

use super::types::UpstreamErrorBody;
use super::{
    CategoryQuery, CreatedOrderResponse, OrderPayload, ProductQuery, RawOrder, StoreApi,
    StoreError,
};

/// Pause between attempts of a retried read.
const READ_RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Longest upstream error message kept for logs and error values.
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

// =============================================================================
// StoreClient
// =============================================================================

/// Client for the upstream store REST API.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<StoreClientInner>,
}

struct StoreClientInner {
    client: reqwest::Client,
    base: Url,
    consumer_key: SecretString,
    consumer_secret: SecretString,
    read_retries: u32,
}

impl StoreClient {
    /// Create a new store API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &WooCommerceConfig, upstream: &UpstreamConfig) -> Result<Self, StoreError> {
        let base = Url::parse(&config.api_base())
            .map_err(|e| StoreError::Config(format!("invalid store URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(upstream.timeout)
            .connect_timeout(upstream.connect_timeout)
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(StoreClientInner {
                client,
                base,
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                read_retries: upstream.read_retries,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.inner
            .base
            .join(path)
            .map_err(|e| StoreError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.inner.client.request(method, url).basic_auth(
            self.inner.consumer_key.expose_secret(),
            Some(self.inner.consumer_secret.expose_secret()),
        )
    }

    /// GET a JSON resource, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, StoreError> {
        let url = self.endpoint(path)?;
        let attempts = self.inner.read_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            let result = self
                .send(self.request(Method::GET, url.clone()).query(params))
                .await;

            match result {
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(
                        path,
                        attempt,
                        cause = %err.category(),
                        "Transient store API failure, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(READ_RETRY_BACKOFF).await;
                }
                other => return other,
            }
        }
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            debug!(
                error = %e,
                body = %truncate(&body, 500),
                "Failed to parse store API response"
            );
            StoreError::Parse(e)
        })
    }
}

/// Map a non-success response to a [`StoreError`].
fn status_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<UpstreamErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    let message = truncate(&message, MAX_ERROR_MESSAGE_CHARS);

    // Unknown ids come back as 404, or as 400 with an `*_invalid_id` code
    let invalid_id = code.as_deref().is_some_and(|c| c.ends_with("invalid_id"));
    if status == StatusCode::NOT_FOUND || invalid_id {
        return StoreError::NotFound(message);
    }

    StoreError::Status {
        status: status.as_u16(),
        code,
        message,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[async_trait]
impl StoreApi for StoreClient {
    #[instrument(skip(self))]
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Value>, StoreError> {
        self.get_json("products", &query.to_params()).await
    }

    #[instrument(skip(self))]
    async fn list_categories(&self, query: &CategoryQuery) -> Result<Vec<Value>, StoreError> {
        self.get_json("products/categories", &query.to_params()).await
    }

    #[instrument(skip(self, payload), fields(line_items = payload.line_items.len()))]
    async fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> Result<CreatedOrderResponse, StoreError> {
        let url = self.endpoint("orders")?;
        self.send(self.request(Method::POST, url).json(payload))
            .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: OrderId) -> Result<Option<RawOrder>, StoreError> {
        match self.get_json(&format!("orders/{order_id}"), &[]).await {
            Ok(order) => Ok(Some(order)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
