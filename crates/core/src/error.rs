use thiserror::Error;

/// Rejections raised by the pure domain crates.
///
/// Messages are user-facing; the API returns them as `msg`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input that breaks a field rule (missing name, negative stock, bad email).
    #[error("{0}")]
    Validation(String),

    /// An id string that is not a UUID.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
