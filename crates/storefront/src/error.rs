//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Error responses are JSON:
//!
//! ```json
//! {"success": false, "code": "order_not_found", "error": "Order not found", "details": "..."}
//! ```
//!
//! Every client-facing text lives in the [`PublicMessage`] table. `code` is
//! stable, so the frontend can show its own translation and fall back to
//! `error`. Upstream bodies and messages are logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::orders::{OrderError, TrackerError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Order status lookup failed.
    #[error("Order status error: {0}")]
    Tracker(#[from] TrackerError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Client-facing error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicMessage {
    CartEmpty,
    InvalidItem,
    InvalidCustomer,
    OrderFailed,
    OrderNotFound,
    OrderForbidden,
    StatusUnavailable,
    NotFound,
    BadRequest,
    Internal,
}

impl PublicMessage {
    pub const ALL: [Self; 10] = [
        Self::CartEmpty,
        Self::InvalidItem,
        Self::InvalidCustomer,
        Self::OrderFailed,
        Self::OrderNotFound,
        Self::OrderForbidden,
        Self::StatusUnavailable,
        Self::NotFound,
        Self::BadRequest,
        Self::Internal,
    ];

    /// `(code, text, hint)` for each message.
    const fn entry(self) -> (&'static str, &'static str, Option<&'static str>) {
        match self {
            Self::CartEmpty => (
                "cart_empty",
                "Cart is empty",
                Some("Add at least one item before checking out"),
            ),
            Self::InvalidItem => ("invalid_item", "Invalid cart item", None),
            Self::InvalidCustomer => ("invalid_customer", "Invalid customer details", None),
            Self::OrderFailed => (
                "order_failed",
                "Order creation failed",
                Some("The store could not create the order, please try again"),
            ),
            Self::OrderNotFound => ("order_not_found", "Order not found", None),
            Self::OrderForbidden => ("order_forbidden", "Order could not be verified", None),
            Self::StatusUnavailable => (
                "status_unavailable",
                "Order status unavailable",
                Some("Please try again shortly"),
            ),
            Self::NotFound => ("not_found", "Not found", None),
            Self::BadRequest => ("bad_request", "Bad request", None),
            Self::Internal => ("internal", "Internal server error", None),
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        self.entry().0
    }

    /// Default English text.
    #[must_use]
    pub const fn text(self) -> &'static str {
        self.entry().1
    }

    /// Fixed follow-up text, if any.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        self.entry().2
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Order(err) if err.is_validation() => StatusCode::BAD_REQUEST,
            Self::Tracker(TrackerError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Tracker(TrackerError::Forbidden) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Order(_) | Self::Tracker(TrackerError::Upstream(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message and optional details.
    fn public_message(&self) -> (PublicMessage, Option<String>) {
        match self {
            Self::Order(OrderError::EmptyCart) => (PublicMessage::CartEmpty, None),
            Self::Order(err @ OrderError::InvalidItem { .. }) => {
                (PublicMessage::InvalidItem, Some(err.to_string()))
            }
            Self::Order(OrderError::InvalidCustomer(err)) => {
                (PublicMessage::InvalidCustomer, Some(err.to_string()))
            }
            Self::Order(OrderError::Creation { cause, .. }) => {
                let hint = PublicMessage::OrderFailed.hint().unwrap_or_default();
                (PublicMessage::OrderFailed, Some(format!("{hint} ({cause})")))
            }
            Self::Tracker(TrackerError::NotFound) => (PublicMessage::OrderNotFound, None),
            Self::Tracker(TrackerError::Forbidden) => (PublicMessage::OrderForbidden, None),
            Self::Tracker(TrackerError::Upstream(_)) => (PublicMessage::StatusUnavailable, None),
            Self::NotFound(what) => (PublicMessage::NotFound, Some(what.clone())),
            Self::BadRequest(msg) => (PublicMessage::BadRequest, Some(msg.clone())),
            // Don't expose internal error details to clients
            Self::Internal(_) => (PublicMessage::Internal, None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (message, details) = self.public_message();
        let body = ErrorBody {
            success: false,
            code: message.code(),
            error: message.text(),
            details: details.or_else(|| message.hint().map(str::to_string)),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Submitting order", Some(&[("line_items", "2")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use axum::body::to_bytes;

    use super::*;
    use crate::woocommerce::{FailureCategory, StoreError};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product hades".to_string());
        assert_eq!(err.to_string(), "Not found: product hades");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Order(OrderError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::Creation {
                status: Some(400),
                cause: FailureCategory::Upstream4xx,
                message: "Invalid product ID.".to_string(),
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Tracker(TrackerError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Tracker(TrackerError::Forbidden)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Tracker(TrackerError::Upstream(StoreError::Timeout))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn upstream_details_are_not_exposed() {
        let (status, body) = body_json(AppError::Order(OrderError::Creation {
            status: Some(500),
            cause: FailureCategory::Upstream5xx,
            message: "Fatal error in /var/www/wp-content/plugins".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Order creation failed");
        assert!(!body.to_string().contains("wp-content"));
    }

    #[tokio::test]
    async fn forbidden_body_has_no_order_fields() {
        let (_, body) = body_json(AppError::Tracker(TrackerError::Forbidden)).await;
        let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["code", "error", "success"]);
        assert_eq!(body["code"], "order_forbidden");
    }

    #[test]
    fn message_codes_are_unique_snake_case() {
        let codes: HashSet<&str> = PublicMessage::ALL.iter().map(|m| m.code()).collect();
        assert_eq!(codes.len(), PublicMessage::ALL.len());
        assert!(codes.iter().all(|c| c.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_')));
    }

    #[tokio::test]
    async fn body_text_comes_from_the_table() {
        let (status, body) = body_json(AppError::NotFound("product hades".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
        assert_eq!(body["error"], PublicMessage::NotFound.text());
        assert_eq!(body["details"], "product hades");

        let (_, body) = body_json(AppError::Order(OrderError::EmptyCart)).await;
        assert_eq!(body["code"], "cart_empty");
        assert_eq!(body["error"], "Cart is empty");
        assert_eq!(body["details"], PublicMessage::CartEmpty.hint().unwrap());

        let (_, body) = body_json(AppError::Order(OrderError::Creation {
            status: None,
            cause: FailureCategory::Timeout,
            message: "timed out".to_string(),
        }))
        .await;
        assert_eq!(body["code"], "order_failed");
        assert!(
            body["details"]
                .as_str()
                .unwrap()
                .starts_with(PublicMessage::OrderFailed.hint().unwrap())
        );
    }
}
