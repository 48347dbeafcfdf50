//! uGames Core - Shared types library.
//!
//! This crate provides the types shared by the storefront service and any
//! tooling built around it:
//! - `storefront` - catalog resolution, checkout and order tracking service
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, statuses and decimal-string price helpers
//! - [`catalog`] - Normalized product and category model
//! - [`cart`] - Client-held cart store and order-creation items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use cart::{Cart, CartLine, OrderItem};
pub use catalog::{Category, Product, TermRef};
pub use types::*;
