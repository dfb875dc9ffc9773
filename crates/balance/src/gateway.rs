use async_trait::async_trait;
use common::{Money, OrderId};

use crate::GatewayError;
use crate::dto::{PreorderData, ProductSnapshot};

/// Trait for balance service operations.
///
/// Implementations report every failure — transport or semantic — as
/// [`GatewayError::External`]; a returned `PreorderData` is always a
/// well-formed success payload, though its embedded status still has to
/// be checked by the caller.
///
/// Known gap: none of these calls carry an idempotency key, so a retry
/// after a timeout can double-block funds remotely if the first attempt
/// actually landed server-side.
#[async_trait]
pub trait BalanceGateway: Send + Sync {
    /// Fetches the remote product catalog.
    async fn fetch_catalog(&self) -> Result<Vec<ProductSnapshot>, GatewayError>;

    /// Places a pre-order block for the given order id and amount.
    async fn place_block(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PreorderData, GatewayError>;

    /// Completes (captures) a previously blocked pre-order.
    async fn complete_remote(&self, order_id: OrderId) -> Result<PreorderData, GatewayError>;
}
