//! uGames Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! - [`catalog`] - catalog resolution over the cache gateway and the store
//! - [`orders`] - order creation and order status tracking
//! - [`woocommerce`] - upstream store REST client and record normalization
//! - [`routes`] - JSON API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod orders;
pub mod routes;
pub mod state;
pub mod woocommerce;

#[cfg(test)]
pub(crate) mod testing;
