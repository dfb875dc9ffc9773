//! Shared types used across the payment workspace.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{OrderId, ProductId};
