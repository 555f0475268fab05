//! Document store abstractions for products, orders, users and login codes.
//!
//! The traits mirror what the storefront needs from a document database:
//! lookups by id, newest-first listings, `$inc`-style stock increments and a
//! conditional decrement for the hardened checkout path. Implementations
//! must never hold a lock across an `.await`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_auth::{OtpChallenge, OtpError, User};
use storefront_catalog::Product;
use storefront_core::{ExpectedVersion, OrderId, ProductId, UserId};
use storefront_orders::{Order, OrderStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryOrderStore, InMemoryOtpStore, InMemoryProductStore, InMemoryUserStore};
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint hit (e.g. email already registered).
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Compare-and-swap lost against a concurrent writer.
    #[error("version conflict (expected: {expected:?}, actual: {actual})")]
    VersionConflict { expected: ExpectedVersion, actual: u64 },

    #[error("record not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &value {
            if db.is_unique_violation() {
                return StoreError::Duplicate(db.message().to_string());
            }
        }
        StoreError::Backend(value.to_string())
    }
}

/// Result of an atomic conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// Stock was taken; carries the new stock level.
    Applied(i64),
    /// Not enough stock; nothing changed. Carries the stock seen.
    Insufficient(i64),
    Missing,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> Result<Product, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Fetch several products; unknown ids are simply absent from the result.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError>;

    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Replace a product document. The stored version becomes `product.version`.
    async fn replace(&self, product: Product, expected: ExpectedVersion) -> Result<Product, StoreError>;

    /// Unconditional `stock += delta`. Returns the new stock, or `None` when
    /// the product does not exist (the adjustment is then a no-op).
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Option<i64>, StoreError>;

    /// `stock -= quantity` only if the result stays `>= 0`, as one atomic step.
    async fn try_decrement_stock(&self, id: ProductId, quantity: i64) -> Result<Decrement, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> Result<Order, StoreError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders, newest first.
    async fn list_all(&self) -> Result<Vec<Order>, StoreError>;

    /// One user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Set the status and bump the version. `NotFound` if the order is gone,
    /// `VersionConflict` if `expected` does not match.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected: ExpectedVersion,
    ) -> Result<Order, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; `Duplicate` if the email is taken.
    async fn insert(&self, user: User) -> Result<User, StoreError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a challenge, replacing any earlier one for the same email.
    async fn put(&self, email: &str, challenge: OtpChallenge) -> Result<(), StoreError>;

    /// Check `submitted` against the stored challenge and record the attempt
    /// in one step. The challenge is dropped on success or on any error other
    /// than a plain mismatch.
    async fn verify_and_consume(
        &self,
        email: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Result<(), OtpError>, StoreError>;
}
