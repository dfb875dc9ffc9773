//! Order and order item entities.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// A line item within an order.
///
/// All fields are frozen snapshots taken when the order was created;
/// later price or name changes on the product never reach back into a
/// persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl OrderItem {
    /// Creates a new line item, deriving the line total from unit price and quantity.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            total_price: unit_price.multiply(quantity),
        }
    }
}

/// An order that has not yet been persisted.
///
/// The store assigns the id when `reserve_and_create` commits; before
/// that point the order exists only as this value. A `NewOrder` is always
/// in `Blocked` status — there is no other way into the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub amount: Money,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Builds a blocked order from its line items.
    ///
    /// The amount is the sum of the line totals, never recomputed later.
    pub fn blocked(product_id: impl Into<ProductId>, items: Vec<OrderItem>) -> Self {
        let amount = items.iter().map(|item| item.total_price).sum();
        Self {
            product_id: product_id.into(),
            amount,
            items,
            created_at: Utc::now(),
        }
    }

    /// Converts into a persisted order once the store has assigned an id.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            product_id: self.product_id,
            amount: self.amount,
            status: OrderStatus::Blocked,
            created_at: self.created_at,
            completed_at: None,
            items: self.items,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of line totals.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Invariant check: the order amount equals the sum of its line totals.
    pub fn amount_matches_items(&self) -> bool {
        self.amount == self.items_total()
    }
}
