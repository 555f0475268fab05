//! Service-level error model shared by the orchestration modules.

use thiserror::Error;

use storefront_auth::{AuthzError, OtpError, TokenError};
use storefront_core::DomainError;
use storefront_orders::OrderError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or incomplete input.
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid credentials or login code.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but not allowed.
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Checkout / status workflow failure (keeps the typed reason).
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Persistence failed. Never shown to callers verbatim.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            invalid @ DomainError::InvalidId(_) => ServiceError::Validation(invalid.to_string()),
        }
    }
}

impl From<OtpError> for ServiceError {
    fn from(value: OtpError) -> Self {
        ServiceError::Unauthenticated(value.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Signing(msg) => ServiceError::Internal(msg),
            other => ServiceError::Unauthenticated(other.to_string()),
        }
    }
}
