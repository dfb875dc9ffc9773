//! Result payloads returned to the boundary layer.

use balance::{BalanceSnapshot, PreorderData};
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use domain::Order;
use serde::{Deserialize, Serialize};

/// Result of a successful order creation: the remote gateway's full
/// block response (pre-order plus balance snapshot), passed through
/// unchanged.
pub type PreorderResult = PreorderData;

/// Snapshot of a completed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub amount: Money,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Order> for CompletedOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            product_id: order.product_id.clone(),
            amount: order.amount,
            status: order.status.to_string(),
            created_at: order.created_at,
            completed_at: order.completed_at,
        }
    }
}

/// Result of a successful order completion: the local order snapshot
/// composed with the remote service's updated balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub order: CompletedOrder,
    pub updated_balance: BalanceSnapshot,
}
