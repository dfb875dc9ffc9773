use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, ProductId};
use domain::{NewOrder, Order, Product};

use crate::Result;

/// Core trait for transactional store implementations.
///
/// Each compound operation executes under a single local transaction
/// with all-or-nothing commit. Implementations must provide isolation
/// sufficient that two concurrent reservations cannot both succeed when
/// only one has enough stock, and that at most one of two concurrent
/// complete/cancel attempts transitions an order out of `Blocked`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts or replaces products. Inventory is seeded externally;
    /// this is the seam that seeding goes through.
    async fn seed_products(&self, products: Vec<Product>) -> Result<()>;

    /// Looks up a product by id.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Loads an order with its line items.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads an order only if it is currently in `Blocked` status.
    async fn get_blocked_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Atomically reserves stock for every requested product and persists
    /// the order, as one commit.
    ///
    /// Returns `None` — with nothing committed and no quantity decremented —
    /// if any product is missing or has insufficient stock.
    async fn reserve_and_create(
        &self,
        order: NewOrder,
        reservations: &HashMap<ProductId, u32>,
    ) -> Result<Option<Order>>;

    /// Marks an order `Completed` with a completion timestamp.
    ///
    /// Returns `None` if the order is missing or was not in `Blocked`
    /// status at commit time (e.g. a concurrent cancellation won).
    async fn complete(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Marks an order `Cancelled` and restores the reserved quantity of
    /// every line item, as one commit.
    ///
    /// Returns `false` if the order is missing or not in `Blocked` status,
    /// so a terminal order is never cancelled (or restored) twice.
    async fn cancel_and_restore(&self, order_id: OrderId) -> Result<bool>;
}
