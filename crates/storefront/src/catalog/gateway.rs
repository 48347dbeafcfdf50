//! Client for the cache gateway fronting the upstream catalog.
//!
//! The gateway serves the whole catalog in one call, as either a bare JSON
//! array or an envelope `{"products"|"data": [...], "cache_warm"|"cached": bool}`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::UpstreamConfig;
use crate::woocommerce::FailureCategory;

/// Errors from the cache gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Gateway returned {0}")]
    Status(u16),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl GatewayError {
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::Http(_) => FailureCategory::Network,
            Self::Timeout => FailureCategory::Timeout,
            Self::Status(status) if *status >= 500 => FailureCategory::Upstream5xx,
            Self::Status(_) => FailureCategory::Upstream4xx,
            Self::Parse(_) => FailureCategory::Parse,
            Self::Config(_) => FailureCategory::Config,
        }
    }
}

/// One gateway response.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySnapshot {
    pub products: Vec<Value>,
    /// The gateway vouches that its cache is populated, so an empty list
    /// really means an empty catalog.
    pub warm: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GatewayBody {
    Bare(Vec<Value>),
    Envelope {
        #[serde(alias = "data")]
        products: Vec<Value>,
        #[serde(default, alias = "cached")]
        cache_warm: bool,
    },
}

impl From<GatewayBody> for GatewaySnapshot {
    fn from(body: GatewayBody) -> Self {
        match body {
            GatewayBody::Bare(products) => Self {
                products,
                warm: false,
            },
            GatewayBody::Envelope {
                products,
                cache_warm,
            } => Self {
                products,
                warm: cache_warm,
            },
        }
    }
}

/// Read-only client for `GET {backend}/api/products`.
#[derive(Clone)]
pub struct CacheGateway {
    inner: Arc<CacheGatewayInner>,
}

struct CacheGatewayInner {
    client: reqwest::Client,
    products_url: Url,
}

impl CacheGateway {
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be built or the HTTP
    /// client cannot be constructed.
    pub fn new(backend_url: &Url, upstream: &UpstreamConfig) -> Result<Self, GatewayError> {
        let products_url = backend_url
            .join("api/products")
            .map_err(|e| GatewayError::Config(format!("invalid backend URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(upstream.timeout)
            .connect_timeout(upstream.connect_timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(CacheGatewayInner {
                client,
                products_url,
            }),
        })
    }

    /// Fetch the full catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, timeout, a non-success
    /// status, or a body that is neither an array nor a known envelope.
    #[instrument(skip(self), fields(url = %self.inner.products_url))]
    pub async fn fetch_products(&self) -> Result<GatewaySnapshot, GatewayError> {
        let response = self
            .inner
            .client
            .get(self.inner.products_url.clone())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let parsed: GatewayBody = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "Failed to parse gateway response");
            GatewayError::Parse(e)
        })?;

        let snapshot = GatewaySnapshot::from(parsed);
        debug!(count = snapshot.products.len(), warm = snapshot.warm, "Gateway snapshot");
        Ok(snapshot)
    }
}
