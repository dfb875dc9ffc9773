use thiserror::Error;

/// Failure signal for remote balance service calls.
///
/// Transport faults, timeouts, an open circuit, non-2xx responses and
/// semantic rejections all collapse into this one kind; the message
/// carries the underlying cause.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("{0}")]
    External(String),
}

impl GatewayError {
    /// Builds an external failure with a context prefix, mirroring the
    /// message shape of the underlying cause.
    pub fn external(context: &str, cause: impl std::fmt::Display) -> Self {
        Self::External(format!("{context}: {cause}"))
    }
}
