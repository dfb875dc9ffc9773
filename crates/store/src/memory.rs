use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId};
use domain::{NewOrder, Order, OrderStatus, Product};
use tokio::sync::RwLock;

use crate::{Result, store::OrderStore};

#[derive(Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    next_order_id: i64,
}

/// In-memory store implementation.
///
/// Used by tests and by the server when no database is configured.
/// Every compound operation holds the write lock for its whole
/// read-then-mutate span, which gives the same isolation the PostgreSQL
/// implementation gets from row locks inside a transaction.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock of a product, for test assertions.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(product_id)
            .map(|p| p.stock)
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn seed_products(&self, products: Vec<Product>) -> Result<()> {
        let mut state = self.state.write().await;
        for product in products {
            state.products.insert(product.id.clone(), product);
        }
        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(product_id).cloned())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_blocked_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .get(&order_id)
            .filter(|o| o.status == OrderStatus::Blocked)
            .cloned())
    }

    async fn reserve_and_create(
        &self,
        order: NewOrder,
        reservations: &HashMap<ProductId, u32>,
    ) -> Result<Option<Order>> {
        let mut state = self.state.write().await;

        // Validate every reservation before touching any quantity.
        for (product_id, quantity) in reservations {
            match state.products.get(product_id) {
                Some(product) if product.has_stock(*quantity) => {}
                _ => return Ok(None),
            }
        }

        for (product_id, quantity) in reservations {
            if let Some(product) = state.products.get_mut(product_id) {
                product.stock -= quantity;
            }
        }

        state.next_order_id += 1;
        let order = order.into_order(OrderId::new(state.next_order_id));
        state.orders.insert(order.id, order.clone());

        Ok(Some(order))
    }

    async fn complete(&self, order_id: OrderId) -> Result<Option<Order>> {
        let mut state = self.state.write().await;

        let Some(order) = state.orders.get_mut(&order_id) else {
            return Ok(None);
        };
        if !order.status.can_complete() {
            return Ok(None);
        }

        order.status = OrderStatus::Completed;
        order.completed_at = Some(Utc::now());
        Ok(Some(order.clone()))
    }

    async fn cancel_and_restore(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;

        let Some(order) = state.orders.get(&order_id) else {
            return Ok(false);
        };
        if !order.status.can_cancel() {
            return Ok(false);
        }

        let items = order.items.clone();
        for item in &items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock += item.quantity;
            }
        }

        let order = state
            .orders
            .get_mut(&order_id)
            .expect("order checked above");
        order.status = OrderStatus::Cancelled;
        order.completed_at = Some(Utc::now());

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use domain::OrderItem;

    async fn seeded_store() -> InMemoryOrderStore {
        let store = InMemoryOrderStore::new();
        store
            .seed_products(vec![Product::new(
                "prod-001",
                "Premium Smartphone",
                Money::from_cents(1000),
                "USD",
                10,
            )])
            .await
            .unwrap();
        store
    }

    fn blocked_order(quantity: u32) -> (NewOrder, HashMap<ProductId, u32>) {
        let items = vec![OrderItem::new(
            "prod-001",
            "Premium Smartphone",
            quantity,
            Money::from_cents(1000),
        )];
        let order = NewOrder::blocked("prod-001", items);
        let reservations = HashMap::from([(ProductId::new("prod-001"), quantity)]);
        (order, reservations)
    }

    #[tokio::test]
    async fn test_reserve_and_create_decrements_stock() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(2);

        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.id, OrderId::new(1));
        assert_eq!(created.status, OrderStatus::Blocked);
        assert_eq!(created.amount, Money::from_cents(2000));
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(8));
    }

    #[tokio::test]
    async fn test_reserve_fails_atomically_on_insufficient_stock() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(11);

        let created = store.reserve_and_create(order, &reservations).await.unwrap();

        assert!(created.is_none());
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(10));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_reserve_fails_on_missing_product() {
        let store = seeded_store().await;
        let items = vec![OrderItem::new("prod-404", "Ghost", 1, Money::from_cents(100))];
        let order = NewOrder::blocked("prod-404", items);
        let reservations = HashMap::from([(ProductId::new("prod-404"), 1)]);

        assert!(store.reserve_and_create(order, &reservations).await.unwrap().is_none());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_complete_transitions_blocked_order() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(2);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();

        let completed = store.complete(created.id).await.unwrap().unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.completed_at.is_some());
        // Stock stays decremented after completion.
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(8));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_blocked_order() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(2);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();

        store.complete(created.id).await.unwrap().unwrap();
        assert!(store.complete(created.id).await.unwrap().is_none());
        assert!(store.complete(OrderId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly_once() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(3);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(7));

        assert!(store.cancel_and_restore(created.id).await.unwrap());
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(10));

        // Second cancel is a no-op: terminal status, no double restore.
        assert!(!store.cancel_and_restore(created.id).await.unwrap());
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(10));

        let order = store.get_order(created.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_rejects_completed_order() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(2);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();
        store.complete(created.id).await.unwrap().unwrap();

        assert!(!store.cancel_and_restore(created.id).await.unwrap());
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(8));
    }

    #[tokio::test]
    async fn test_get_blocked_order_filters_by_status() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(1);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();

        assert!(store.get_blocked_order(created.id).await.unwrap().is_some());
        store.cancel_and_restore(created.id).await.unwrap();
        assert!(store.get_blocked_order(created.id).await.unwrap().is_none());
        // Plain lookup still sees the cancelled order (audit trail).
        assert!(store.get_order(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_reservations_only_one_wins() {
        let store = seeded_store().await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let (order, reservations) = blocked_order(6);
                store.reserve_and_create(order, &reservations).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                successes += 1;
            }
        }

        // stock=10, two requests for 6: exactly one can fit.
        assert_eq!(successes, 1);
        assert_eq!(store.stock_of(&ProductId::new("prod-001")).await, Some(4));
    }

    #[tokio::test]
    async fn test_concurrent_complete_and_cancel_single_winner() {
        let store = seeded_store().await;
        let (order, reservations) = blocked_order(2);
        let created = store
            .reserve_and_create(order, &reservations)
            .await
            .unwrap()
            .unwrap();

        let complete_store = store.clone();
        let cancel_store = store.clone();
        let (completed, cancelled) = tokio::join!(
            tokio::spawn(async move { complete_store.complete(created.id).await.unwrap() }),
            tokio::spawn(async move { cancel_store.cancel_and_restore(created.id).await.unwrap() }),
        );
        let completed = completed.unwrap();
        let cancelled = cancelled.unwrap();

        assert!(completed.is_some() != cancelled, "exactly one must win");

        let order = store.get_order(created.id).await.unwrap().unwrap();
        assert!(order.status.is_terminal());
    }
}
