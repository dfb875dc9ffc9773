//! Saga orchestrator for order creation, completion and cancellation.

use std::collections::HashMap;

use balance::{BalanceGateway, STATUS_BLOCKED, STATUS_COMPLETED};
use common::{OrderId, ProductId};
use domain::{NewOrder, OrderItem};
use store::OrderStore;

use crate::error::{OrderError, Result};
use crate::result::{CompletedOrder, CompletionResult, PreorderResult};

/// Business ceiling on the quantity of a single order.
pub const MAX_ORDER_QUANTITY: u32 = 100;

/// Orchestrates the order saga across the transactional store and the
/// remote balance gateway.
///
/// Each operation is a sequence of local-transaction and remote-call
/// steps. A remote failure after a committed local step triggers
/// compensation (cancel the order, restore the reserved stock) before
/// the error is surfaced. Both collaborators are injected so tests can
/// substitute fakes.
pub struct OrderSaga<S, G>
where
    S: OrderStore,
    G: BalanceGateway,
{
    store: S,
    gateway: G,
}

impl<S, G> OrderSaga<S, G>
where
    S: OrderStore,
    G: BalanceGateway,
{
    /// Creates a new saga orchestrator.
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Creates an order: reserves stock locally, then blocks funds remotely.
    ///
    /// On a block failure the local reservation is compensated before the
    /// error is returned. Returns the gateway's full block response.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, product_id: &str, quantity: u32) -> Result<PreorderResult> {
        metrics::counter!("order_create_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let product_id = ProductId::new(product_id);
        if product_id.is_blank() || quantity == 0 {
            return Err(OrderError::Validation(
                "Invalid order request. ProductId and valid Quantity are required.".to_string(),
            ));
        }
        if quantity > MAX_ORDER_QUANTITY {
            return Err(OrderError::Validation(
                "Maximum order quantity is 100 items per order".to_string(),
            ));
        }

        let product = self
            .store
            .get_product(&product_id)
            .await?
            .ok_or_else(|| OrderError::Validation(format!("Product not found: {product_id}")))?;

        // Step 1 (local, atomic): reserve stock and persist the order as
        // one commit. A None token means nothing was committed.
        let order = NewOrder::blocked(
            product_id.clone(),
            vec![OrderItem::new(
                product_id.clone(),
                product.name.clone(),
                quantity,
                product.price,
            )],
        );
        let reservations = HashMap::from([(product_id.clone(), quantity)]);

        let Some(order) = self.store.reserve_and_create(order, &reservations).await? else {
            return Err(OrderError::Validation(format!(
                "Failed to reserve stock. Available: {}, Requested: {}",
                product.stock, quantity
            )));
        };

        tracing::info!(order_id = %order.id, amount = %order.amount, "stock reserved, order blocked");

        // Step 2 (remote): block funds for the order's amount.
        let block = match self.gateway.place_block(order.id, order.amount).await {
            Ok(block) => block,
            Err(err) => {
                self.compensate(order.id).await;
                return Err(OrderError::ExternalService(err.to_string()));
            }
        };

        // Only an explicit "blocked" status counts as granted.
        if block.pre_order.status != STATUS_BLOCKED {
            tracing::warn!(
                order_id = %order.id,
                status = %block.pre_order.status,
                "balance block not granted"
            );
            self.compensate(order.id).await;
            return Err(OrderError::InsufficientBalance(
                "Insufficient balance to complete the order".to_string(),
            ));
        }

        metrics::counter!("orders_blocked_total").increment(1);
        metrics::histogram!("order_saga_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, amount = %order.amount, "order created");

        Ok(block)
    }

    /// Completes a blocked order: captures the payment remotely, then
    /// finalizes the order locally.
    ///
    /// A remote completion failure compensates the order (cancel +
    /// restore stock); the surfaced message tells the caller that the
    /// restore happened.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn complete_order(&self, order_id: OrderId) -> Result<CompletionResult> {
        let started = std::time::Instant::now();

        // Step 1: the order must currently be Blocked.
        let order = self
            .store
            .get_blocked_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(format!("Order not found: {order_id}")))?;

        // Step 2 (remote): capture the blocked funds.
        let completion = match self.gateway.complete_remote(order.id).await {
            Ok(completion) if completion.pre_order.status == STATUS_COMPLETED => completion,
            Ok(completion) => {
                tracing::warn!(
                    %order_id,
                    status = %completion.pre_order.status,
                    "remote completion not granted"
                );
                self.compensate(order_id).await;
                return Err(OrderError::ExternalService(
                    "Payment completion failed - stock has been restored".to_string(),
                ));
            }
            Err(err) => {
                tracing::warn!(%order_id, error = %err, "remote completion failed");
                self.compensate(order_id).await;
                return Err(OrderError::ExternalService(
                    "Payment completion failed - stock has been restored".to_string(),
                ));
            }
        };

        // Step 3 (local, atomic): finalize. A None token means the order
        // left Blocked status under us (concurrent cancellation).
        let Some(completed) = self.store.complete(order_id).await? else {
            self.compensate(order_id).await;
            return Err(OrderError::ExternalService(
                "Failed to complete order in store".to_string(),
            ));
        };

        metrics::counter!("orders_completed_total").increment(1);
        metrics::histogram!("order_saga_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, "order completed");

        Ok(CompletionResult {
            order: CompletedOrder::from(&completed),
            updated_balance: completion.updated_balance,
        })
    }

    /// Cancels a blocked order at the caller's request and restores its
    /// stock. No remote call: this is not the compensation path.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<bool> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(format!("Order not found: {order_id}")))?;

        if !order.status.can_cancel() {
            return Err(OrderError::Validation(format!(
                "Order cannot be cancelled. Current status: {}",
                order.status
            )));
        }

        let cancelled = self.store.cancel_and_restore(order_id).await?;
        if cancelled {
            metrics::counter!("orders_cancelled_total").increment(1);
            tracing::info!(%order_id, "order cancelled by caller");
        }
        Ok(cancelled)
    }

    /// Cancels the order and restores its reserved stock after a failed
    /// remote step. Runs before the error is surfaced so that an error
    /// always implies a consistent terminal state.
    async fn compensate(&self, order_id: OrderId) {
        match self.store.cancel_and_restore(order_id).await {
            Ok(true) => {
                metrics::counter!("orders_compensated_total").increment(1);
                tracing::warn!(%order_id, "order cancelled and stock restored");
            }
            Ok(false) => {
                tracing::warn!(%order_id, "compensation skipped: order already terminal");
            }
            Err(err) => {
                tracing::error!(%order_id, error = %err, "compensation failed");
            }
        }
    }
}
