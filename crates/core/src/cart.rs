//! Client-held cart store.
//!
//! The cart lives with the shopper (browser storage) and is only handed to the
//! server as the input of order creation. This module owns the cart's
//! invariants: at most one line per product, and every quantity at least 1.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{ProductId, parse_amount};

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price as displayed when the product was added (decimal string).
    pub unit_price: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub slug: String,
}

impl CartLine {
    /// Build a quantity-1 line from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.display_price().to_string(),
            image: product.primary_image().map(str::to_string),
            quantity: 1,
            slug: product.slug.clone(),
        }
    }

    /// Line total; an unparsable unit price counts as zero.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        parse_amount(&self.unit_price).unwrap_or(Decimal::ZERO) * Decimal::from(self.quantity)
    }
}

/// The `{product_id, quantity}` pair an order is created from.
///
/// Prices are deliberately absent: the upstream store prices the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product line.
    ///
    /// Re-adding a product already in the cart increments that line's quantity
    /// by one instead of creating a second line. A new line always starts at
    /// quantity 1, whatever quantity the caller passed.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self.line_mut(line.product_id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine { quantity: 1, ..line });
    }

    /// Set the quantity of a line. Quantity 0 removes the line.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a product's line. Returns `false` when it was not in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Display total from the stored unit prices.
    ///
    /// Informational only; the order total is computed upstream.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The order-creation input for this cart.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines.iter().map(OrderItem::from).collect()
    }

    /// Serialize for client-side persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a persisted cart, re-establishing the invariants: duplicate
    /// product lines are merged and zero-quantity lines dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a serialized cart.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let stored: Vec<CartLine> = serde_json::from_str(raw)?;
        Ok(Self::from_lines(stored))
    }

    /// Like [`Cart::from_json`], but a corrupt payload yields an empty cart.
    #[must_use]
    pub fn restore_or_empty(raw: &str) -> Self {
        Self::from_json(raw).unwrap_or_default()
    }

    fn from_lines(stored: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in stored.into_iter().filter(|l| l.quantity > 0) {
            if let Some(existing) = cart.line_mut(line.product_id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                cart.lines.push(line);
            }
        }
        cart
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::catalog::fixtures::product;

    fn line(id: i64, price: &str) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Game {id}"),
            unit_price: price.to_string(),
            image: None,
            quantity: 1,
            slug: format!("game-{id}"),
        }
    }

    #[test]
    fn test_readding_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(line(42, "10.00"));
        cart.add(line(42, "10.00"));
        cart.add(line(7, "5.00"));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_new_line_starts_at_one() {
        let mut cart = Cart::new();
        cart.add(CartLine {
            quantity: 9,
            ..line(1, "1.00")
        });
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add(line(1, "1.00"));

        assert!(cart.set_quantity(ProductId::new(1), 4));
        assert_eq!(cart.item_count(), 4);
        assert!(!cart.set_quantity(ProductId::new(2), 4));

        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.is_empty());
        assert!(!cart.remove(ProductId::new(1)));
    }

    #[test]
    fn test_total_uses_decimal_arithmetic() {
        let mut cart = Cart::new();
        cart.add(line(1, "0.10"));
        cart.add(line(1, "0.10"));
        cart.add(line(2, "0.20"));
        cart.add(line(3, "not a price"));

        assert_eq!(cart.total(), Decimal::from_str("0.40").unwrap());
    }

    #[test]
    fn test_order_items_carry_no_price() {
        let mut cart = Cart::new();
        cart.add(line(42, "10.00"));
        cart.add(line(42, "10.00"));

        let items = cart.order_items();
        assert_eq!(
            items,
            vec![OrderItem {
                product_id: ProductId::new(42),
                quantity: 2
            }]
        );
        let json = serde_json::to_value(items[0]).unwrap();
        assert_eq!(json, serde_json::json!({"product_id": 42, "quantity": 2}));
    }

    #[test]
    fn test_order_item_accepts_id_alias() {
        let item: OrderItem = serde_json::from_str(r#"{"id": 42, "quantity": 2}"#).unwrap();
        assert_eq!(item.product_id, ProductId::new(42));
    }

    #[test]
    fn test_restore_merges_duplicates_and_drops_zero() {
        let raw = serde_json::to_string(&vec![
            line(1, "1.00"),
            CartLine {
                quantity: 2,
                ..line(1, "1.00")
            },
            CartLine {
                quantity: 0,
                ..line(2, "1.00")
            },
        ])
        .unwrap();

        let cart = Cart::from_json(&raw).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_restore_corrupt_payload_is_empty() {
        assert!(Cart::restore_or_empty("{not json").is_empty());
        assert!(Cart::from_json("{not json").is_err());
    }

    #[test]
    fn test_persistence_survives_reload() {
        let mut cart = Cart::new();
        cart.add(line(5, "12.50"));
        let restored = Cart::from_json(&cart.to_json().unwrap()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_line_from_product() {
        let mut p = product(9, "hades");
        p.images = vec!["https://cdn/hades.jpg".into()];
        let line = CartLine::from_product(&p);
        assert_eq!(line.product_id, ProductId::new(9));
        assert_eq!(line.unit_price, "100.00");
        assert_eq!(line.image.as_deref(), Some("https://cdn/hades.jpg"));
        assert_eq!(line.quantity, 1);
    }
}
