use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::{Money, OrderId};

use crate::dto::{
    BalanceSnapshot, PreorderData, ProductSnapshot, RemoteOrder, STATUS_BLOCKED, STATUS_COMPLETED,
};
use crate::gateway::BalanceGateway;
use crate::GatewayError;

#[derive(Debug)]
struct FakeState {
    catalog: Vec<ProductSnapshot>,
    balance: BalanceSnapshot,
    blocks: HashMap<String, Money>,
    fail_on_catalog: bool,
    fail_on_block: bool,
    fail_on_complete: bool,
    block_status: String,
    complete_status: String,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            catalog: Vec::new(),
            balance: BalanceSnapshot {
                user_id: "user-001".to_string(),
                total_balance: Money::from_cents(100_000),
                available_balance: Money::from_cents(100_000),
                blocked_balance: Money::zero(),
                currency: "USD".to_string(),
                last_updated: Utc::now(),
            },
            blocks: HashMap::new(),
            fail_on_catalog: false,
            fail_on_block: false,
            fail_on_complete: false,
            block_status: STATUS_BLOCKED.to_string(),
            complete_status: STATUS_COMPLETED.to_string(),
        }
    }
}

/// In-memory balance gateway for testing.
///
/// Models the remote service's happy path (funds move from available to
/// blocked on a block, and are captured on completion) and exposes
/// knobs to force transport failures or non-granted statuses.
#[derive(Clone, Default)]
pub struct InMemoryBalanceGateway {
    state: Arc<RwLock<FakeState>>,
}

impl InMemoryBalanceGateway {
    /// Creates a new fake gateway with a default balance of $1000.00.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the remote catalog.
    pub fn set_catalog(&self, catalog: Vec<ProductSnapshot>) {
        self.state.write().unwrap().catalog = catalog;
    }

    /// Configures catalog fetches to fail at the transport level.
    pub fn set_fail_on_catalog(&self, fail: bool) {
        self.state.write().unwrap().fail_on_catalog = fail;
    }

    /// Configures block calls to fail at the transport level.
    pub fn set_fail_on_block(&self, fail: bool) {
        self.state.write().unwrap().fail_on_block = fail;
    }

    /// Configures complete calls to fail at the transport level.
    pub fn set_fail_on_complete(&self, fail: bool) {
        self.state.write().unwrap().fail_on_complete = fail;
    }

    /// Overrides the status returned by block calls (default `"blocked"`).
    pub fn set_block_status(&self, status: impl Into<String>) {
        self.state.write().unwrap().block_status = status.into();
    }

    /// Overrides the status returned by complete calls (default `"completed"`).
    pub fn set_complete_status(&self, status: impl Into<String>) {
        self.state.write().unwrap().complete_status = status.into();
    }

    /// Returns the number of outstanding blocks.
    pub fn block_count(&self) -> usize {
        self.state.read().unwrap().blocks.len()
    }

    /// Returns the currently available balance.
    pub fn available_balance(&self) -> Money {
        self.state.read().unwrap().balance.available_balance
    }
}

#[async_trait]
impl BalanceGateway for InMemoryBalanceGateway {
    async fn fetch_catalog(&self) -> Result<Vec<ProductSnapshot>, GatewayError> {
        let state = self.state.read().unwrap();
        if state.fail_on_catalog {
            return Err(GatewayError::External(
                "Failed to fetch products: connection refused".to_string(),
            ));
        }
        Ok(state.catalog.clone())
    }

    async fn place_block(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Result<PreorderData, GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_block {
            return Err(GatewayError::External(
                "Failed to create preorder: connection refused".to_string(),
            ));
        }

        let status = if state.block_status == STATUS_BLOCKED
            && state.balance.available_balance >= amount
        {
            state.balance.available_balance = state.balance.available_balance - amount;
            state.balance.blocked_balance += amount;
            state.blocks.insert(order_id.to_string(), amount);
            STATUS_BLOCKED.to_string()
        } else if state.block_status != STATUS_BLOCKED {
            state.block_status.clone()
        } else {
            "rejected".to_string()
        };

        state.balance.last_updated = Utc::now();
        Ok(PreorderData {
            pre_order: RemoteOrder {
                order_id: order_id.to_string(),
                amount,
                status,
            },
            updated_balance: state.balance.clone(),
        })
    }

    async fn complete_remote(&self, order_id: OrderId) -> Result<PreorderData, GatewayError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_complete {
            return Err(GatewayError::External(
                "Failed to complete order: connection refused".to_string(),
            ));
        }

        let key = order_id.to_string();
        let amount = state.blocks.get(&key).copied().unwrap_or_default();

        let status = if state.complete_status != STATUS_COMPLETED {
            state.complete_status.clone()
        } else if state.blocks.contains_key(&key) {
            state.blocks.remove(&key);
            state.balance.blocked_balance = state.balance.blocked_balance - amount;
            state.balance.total_balance = state.balance.total_balance - amount;
            STATUS_COMPLETED.to_string()
        } else {
            "not_found".to_string()
        };

        state.balance.last_updated = Utc::now();
        Ok(PreorderData {
            pre_order: RemoteOrder {
                order_id: key,
                amount,
                status,
            },
            updated_balance: state.balance.clone(),
        })
    }
}
