//! Storefront user accounts (passwordless: identified by email).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, UserId};

use crate::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new account after validating name and email.
    ///
    /// The email is normalized (trimmed, lowercased) so lookups are
    /// case-insensitive.
    pub fn register(
        name: &str,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }

        Ok(Self {
            id: UserId::new(),
            name: name.to_string(),
            email,
            role,
            created_at: now,
        })
    }
}

/// Trim + lowercase, and reject anything that is not shaped like `local@domain`.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => {
            Ok(email)
        }
        _ => Err(DomainError::validation("a valid email is required")),
    }
}

/// Name used for accounts auto-created at first login: the email local part.
pub fn derive_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
