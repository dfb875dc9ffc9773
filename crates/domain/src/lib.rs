//! Domain entities for the payment system.
//!
//! The two aggregates here — [`Product`] (inventory) and [`Order`] — are
//! owned exclusively by the transactional store; everything else reads
//! them as immutable snapshots.

pub mod order;
pub mod product;
pub mod status;

pub use order::{NewOrder, Order, OrderItem};
pub use product::Product;
pub use status::OrderStatus;
