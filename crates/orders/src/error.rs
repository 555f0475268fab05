use thiserror::Error;

/// Deterministic failures of the order workflow.
///
/// Messages are user-facing: the API returns them verbatim as `msg`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("Product not found: {item}")]
    ProductNotFound { item: String },

    #[error("Order not found")]
    OrderNotFound,

    #[error("Insufficient stock for {item}. Available: {available}")]
    InsufficientStock { item: String, available: i64 },

    /// Lost a compare-and-swap race on the order (hardened mode only).
    #[error("Order was modified concurrently; retry")]
    Conflict,
}

impl OrderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
