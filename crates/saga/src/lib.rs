//! Order saga orchestration.
//!
//! An order spans two resources that cannot be updated atomically
//! together: the local transactional store (inventory + orders) and the
//! remote balance service. The saga sequences local-transaction and
//! remote-call steps and, when a later step fails, compensates the
//! earlier ones — cancelling the order and restoring the reserved stock
//! — before any error reaches the caller. "Error returned" therefore
//! always means "system is in a consistent terminal state".

pub mod error;
pub mod orchestrator;
pub mod result;

pub use error::OrderError;
pub use orchestrator::{MAX_ORDER_QUANTITY, OrderSaga};
pub use result::{CompletedOrder, CompletionResult, PreorderResult};
