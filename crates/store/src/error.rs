use thiserror::Error;

/// Transaction-level store faults.
///
/// Business-level rejections (insufficient stock, wrong order status)
/// are not errors; the compound operations report them as `None`/`false`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred. The enclosing transaction has rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted row could not be mapped back into a domain value.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}
