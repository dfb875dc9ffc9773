//! Transactional store for inventory and orders.
//!
//! The store owns the only shared mutable state in the system (product
//! stock and order status) and exposes it exclusively through compound
//! operations that commit as a single unit:
//!
//! - reserve stock and create an order,
//! - complete an order,
//! - cancel an order and restore its reserved stock.
//!
//! Business-level failures (missing product, insufficient stock, order
//! not in `Blocked` status) are reported as explicit `None`/`false`
//! tokens so callers can branch on them; [`StoreError`] is reserved for
//! transaction-level faults, which always roll back fully.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;
pub use store::OrderStore;

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
