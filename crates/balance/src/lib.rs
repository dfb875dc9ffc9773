//! Gateway to the remote balance-holding service.
//!
//! The remote service is a black box reachable through a fixed
//! request/response contract; this crate translates domain requests into
//! HTTP calls routed through a resilience envelope (retry, circuit
//! breaker, per-attempt timeout) and collapses every failure mode —
//! transport fault, non-2xx status, timeout, open circuit, or a
//! well-formed response that rejects the operation — into a single
//! [`GatewayError::External`] signal. Callers never have to distinguish
//! a network failure from a semantic rejection.

pub mod dto;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod resilience;

pub use dto::{
    ApiEnvelope, BalanceSnapshot, PreorderData, ProductSnapshot, RemoteOrder, STATUS_BLOCKED,
    STATUS_COMPLETED,
};
pub use error::GatewayError;
pub use gateway::BalanceGateway;
pub use http::HttpBalanceGateway;
pub use memory::InMemoryBalanceGateway;
pub use resilience::{ResilienceConfig, ResilienceEnvelope};
