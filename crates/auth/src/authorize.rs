use thiserror::Error;

use storefront_core::UserId;

use crate::{JwtClaims, Role};

/// An authenticated caller, derived from verified token claims.
///
/// Construction is decoupled from transport: the API builds it from a token,
/// tests build it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<JwtClaims> for Principal {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("Access denied. Admin only.")]
    AdminOnly,

    #[error("Access denied.")]
    NotOwner,
}

/// Admin gate: only callers whose verified role claim is `admin` pass.
///
/// - No IO
/// - No panics
pub fn require_admin(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::AdminOnly)
    }
}

/// Owner-or-admin gate for per-user resources.
pub fn require_owner_or_admin(principal: &Principal, owner: UserId) -> Result<(), AuthzError> {
    if principal.is_admin() || principal.user_id == owner {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
