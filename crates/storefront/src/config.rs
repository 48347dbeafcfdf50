//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WOOCOMMERCE_URL` - Base URL of the upstream store (e.g., <https://shop.example.com>)
//! - `WOOCOMMERCE_KEY` - REST API consumer key
//! - `WOOCOMMERCE_SECRET` - REST API consumer secret
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_URL` - Cache gateway base URL (default: <http://localhost:3001>)
//! - `WOOCOMMERCE_API_VERSION` - REST namespace (default: wc/v3)
//! - `CATALOG_CACHE_ONLY` - Never fall back to the live store for the catalog (default: false)
//! - `CATALOG_MAX_PAGES` - Page ceiling for the paginated catalog fetch (default: 200)
//! - `CATALOG_MEMO_TTL_SECS` - Development memo lifetime (default: 300)
//! - `CATALOG_DEADLINE_SECS` - Time budget for the whole paginated catalog fetch (default: 60)
//! - `APP_ENV` - `production` or `development` (default: production)
//! - `UPSTREAM_TIMEOUT_SECS` - Total timeout per upstream call (default: 15)
//! - `UPSTREAM_CONNECT_TIMEOUT_SECS` - Connect timeout per upstream call (default: 5)
//! - `STORE_READ_RETRIES` - Extra attempts for transient read failures (default: 1)
//! - `GUEST_EMAIL_DOMAIN` - Domain of synthesized guest emails (default: guest.invalid)
//! - `DEFAULT_COUNTRY` - Billing country when none is supplied (default: TR)
//! - `ORDER_SUCCESS_PATH` / `ORDER_PENDING_PATH` / `ORDER_FAILED_PATH` - Order result views
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Execution context. Development-only behavior (the catalog memo) is keyed
/// off this value and never active in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Production,
    Development,
}

impl AppEnvironment {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl std::str::FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "local" => Ok(Self::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Execution context
    pub environment: AppEnvironment,
    /// Cache gateway base URL
    pub backend_url: Url,
    /// Upstream store API configuration
    pub woocommerce: WooCommerceConfig,
    /// Upstream call limits shared by every HTTP client
    pub upstream: UpstreamConfig,
    /// Catalog resolution policy
    pub catalog: CatalogConfig,
    /// Checkout defaults and result views
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Upstream store REST API configuration.
///
/// Implements `Debug` manually to redact credentials.
#[derive(Clone)]
pub struct WooCommerceConfig {
    /// Store base URL (without the `/wp-json` suffix)
    pub store_url: Url,
    /// REST namespace (e.g., wc/v3)
    pub api_version: String,
    /// Consumer key (server-side only)
    pub consumer_key: SecretString,
    /// Consumer secret (server-side only)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooCommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooCommerceConfig")
            .field("store_url", &self.store_url.as_str())
            .field("api_version", &self.api_version)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

impl WooCommerceConfig {
    /// Base URL of the REST namespace, always ending in `/`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!(
            "{}/wp-json/{}/",
            self.store_url.as_str().trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

/// Limits applied to every outbound call.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra attempts for idempotent reads that fail transiently.
    pub read_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            read_retries: 1,
        }
    }
}

/// Catalog resolution policy.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Serve the catalog from the cache gateway only.
    pub cache_only: bool,
    /// Hard ceiling on pages requested by the paginated fetch.
    pub max_pages: u32,
    /// Lifetime of the development memo.
    pub memo_ttl: Duration,
    /// Budget for the whole paginated fetch, across all pages and retries.
    pub deadline: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_only: false,
            max_pages: 200,
            memo_ttl: Duration::from_secs(300),
            deadline: Duration::from_secs(60),
        }
    }
}

/// Checkout defaults and order result views.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub guest_email_domain: String,
    pub default_country: String,
    pub success_path: String,
    pub pending_path: String,
    pub failure_path: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            guest_email_domain: "guest.invalid".to_string(),
            default_country: "TR".to_string(),
            success_path: "/order/success".to_string(),
            pending_path: "/order/pending".to_string(),
            failure_path: "/order/failed".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if credentials fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env.parsed("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed("STOREFRONT_PORT", "3000")?;
        let environment = env.parsed("APP_ENV", "production")?;
        let backend_url = env.url("BACKEND_URL", Some("http://localhost:3001"))?;

        let woocommerce = WooCommerceConfig {
            store_url: env.url("WOOCOMMERCE_URL", None)?,
            api_version: env.or_default("WOOCOMMERCE_API_VERSION", "wc/v3"),
            consumer_key: env.validated_secret("WOOCOMMERCE_KEY")?,
            consumer_secret: env.validated_secret("WOOCOMMERCE_SECRET")?,
        };

        let upstream = UpstreamConfig {
            timeout: Duration::from_secs(env.parsed("UPSTREAM_TIMEOUT_SECS", "15")?),
            connect_timeout: Duration::from_secs(
                env.parsed("UPSTREAM_CONNECT_TIMEOUT_SECS", "5")?,
            ),
            read_retries: env.parsed("STORE_READ_RETRIES", "1")?,
        };
        if upstream.timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "UPSTREAM_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let catalog = CatalogConfig {
            cache_only: env.flag("CATALOG_CACHE_ONLY", false)?,
            max_pages: env.parsed("CATALOG_MAX_PAGES", "200")?,
            memo_ttl: Duration::from_secs(env.parsed("CATALOG_MEMO_TTL_SECS", "300")?),
            deadline: Duration::from_secs(env.parsed("CATALOG_DEADLINE_SECS", "60")?),
        };
        if catalog.max_pages == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_MAX_PAGES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if catalog.deadline.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_DEADLINE_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let defaults = CheckoutConfig::default();
        let checkout = CheckoutConfig {
            guest_email_domain: env.or_default("GUEST_EMAIL_DOMAIN", &defaults.guest_email_domain),
            default_country: env.or_default("DEFAULT_COUNTRY", &defaults.default_country),
            success_path: env.or_default("ORDER_SUCCESS_PATH", &defaults.success_path),
            pending_path: env.or_default("ORDER_PENDING_PATH", &defaults.pending_path),
            failure_path: env.or_default("ORDER_FAILED_PATH", &defaults.failure_path),
        };

        let log_format = match env.optional("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'pretty' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            environment,
            backend_url,
            woocommerce,
            upstream,
            catalog,
            checkout,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed accessors over a variable lookup.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }

    fn url(&self, key: &str, default: Option<&str>) -> Result<Url, ConfigError> {
        let raw = match default {
            Some(default) => self.or_default(key, default),
            None => self.required(key)?,
        };
        Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Load and validate a credential.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a credential is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real consumer keys are long random hex strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the generated API credentials."
            ),
        ));
    }

    Ok(())
}
