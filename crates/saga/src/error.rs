use store::StoreError;
use thiserror::Error;

/// Failure kinds surfaced by order operations.
///
/// Every variant carries a stable, human-readable message; the boundary
/// layer maps kinds to transport status codes, the core never does.
/// When a mid-saga error is returned, compensation has already been
/// attempted — the caller never observes an in-between state.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Bad input, business-rule ceiling exceeded, product missing, or an
    /// order in the wrong status for the requested operation.
    #[error("{0}")]
    Validation(String),

    /// The remote service explicitly declined to block funds.
    #[error("{0}")]
    InsufficientBalance(String),

    /// Remote transport/timeout/circuit-open/malformed-response failure,
    /// or a local transaction fault (rolled back before surfacing).
    #[error("{0}")]
    ExternalService(String),

    /// No matching order (or none in the status the operation requires).
    #[error("{0}")]
    OrderNotFound(String),
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        OrderError::ExternalService(format!("Store failure: {err}"))
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, OrderError>;
