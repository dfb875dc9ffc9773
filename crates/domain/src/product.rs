//! Inventory product entity.

use common::{Money, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inventory item.
///
/// `stock` is a `u32`, so it can never go negative; a reservation that
/// would drive it below zero must be rejected by the store before any
/// decrement happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub currency: String,
    pub category: String,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        currency: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            currency: currency.into(),
            category: String::new(),
            stock,
            created_at: Utc::now(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_stock() {
        let product = Product::new("prod-001", "Premium Smartphone", Money::from_cents(1999), "USD", 42);
        assert!(product.has_stock(42));
        assert!(product.has_stock(1));
        assert!(!product.has_stock(43));
    }

    #[test]
    fn test_zero_stock_rejects_any_quantity() {
        let product = Product::new("prod-003", "Smart Watch", Money::from_cents(1299), "USD", 0);
        assert!(!product.has_stock(1));
        assert!(product.has_stock(0));
    }

    #[test]
    fn test_builder_fields() {
        let product = Product::new("prod-005", "Wireless Charger", Money::from_cents(999), "USD", 120)
            .with_description("Fast charging for compatible devices")
            .with_category("Accessories");
        assert_eq!(product.category, "Accessories");
        assert_eq!(product.description, "Fast charging for compatible devices");
    }
}
