//! Checkout and order tracking.
//!
//! - [`OrderOrchestrator`] turns cart items plus a billing snapshot into an
//!   upstream order and returns where the shopper pays.
//! - [`OrderStatusTracker`] reads an order back by id and key and decides
//!   which result page it belongs on.
//!
//! This service never writes order status; the upstream owns the lifecycle.

pub mod billing;
mod orchestrator;
mod tracker;

pub use billing::{BillingAddress, CustomerInfo, GuestIdentity, complete_address};
pub use orchestrator::{
    ClientContext, CreatedOrder, DEFAULT_ORDER_NOTE, FALLBACK_CLIENT_IP, FALLBACK_USER_AGENT,
    OrderError, OrderOrchestrator, payment_url,
};
pub use tracker::{
    OrderLineView, OrderStatusTracker, OrderStatusView, OrderView, RedirectDecision,
    TrackerError, ViewKind, ViewPaths, route,
};
