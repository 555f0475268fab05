//! `storefront-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! tokens are signed, which role may do what, and how one-time login codes
//! are checked, but not where users or codes are kept.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod otp;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Principal, require_admin, require_owner_or_admin};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtIssuer, JwtValidator, TokenError};
pub use otp::{OtpChallenge, OtpError, generate_code};
pub use roles::Role;
pub use user::{User, derive_name_from_email, normalize_email};
