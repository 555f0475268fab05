//! In-memory stores for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storefront_auth::{OtpChallenge, OtpError, User};
use storefront_catalog::Product;
use storefront_core::{ExpectedVersion, OrderId, ProductId, UserId};
use storefront_orders::{Order, OrderStatus};

use super::{Decrement, OrderStore, OtpStore, ProductStore, StoreError, UserStore};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Backend("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Backend("lock poisoned".to_string()))
}

fn check_version(expected: ExpectedVersion, actual: u64) -> Result<(), StoreError> {
    if expected.matches(actual) {
        Ok(())
    } else {
        Err(StoreError::VersionConflict { expected, actual })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut map = write(&self.inner)?;
        if map.contains_key(&product.id) {
            return Err(StoreError::Duplicate(format!("product {}", product.id)));
        }
        map.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(read(&self.inner)?.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let map = read(&self.inner)?;
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut all: Vec<Product> = read(&self.inner)?.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn replace(&self, product: Product, expected: ExpectedVersion) -> Result<Product, StoreError> {
        let mut map = write(&self.inner)?;
        let current = map.get_mut(&product.id).ok_or(StoreError::NotFound)?;
        check_version(expected, current.version)?;
        *current = product.clone();
        Ok(product)
    }

    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Option<i64>, StoreError> {
        let mut map = write(&self.inner)?;
        Ok(map.get_mut(&id).map(|p| {
            p.stock += delta;
            p.version += 1;
            p.stock
        }))
    }

    async fn try_decrement_stock(&self, id: ProductId, quantity: i64) -> Result<Decrement, StoreError> {
        let mut map = write(&self.inner)?;
        let Some(p) = map.get_mut(&id) else {
            return Ok(Decrement::Missing);
        };
        if p.stock < quantity {
            return Ok(Decrement::Insufficient(p.stock));
        }
        p.stock -= quantity;
        p.version += 1;
        Ok(Decrement::Applied(p.stock))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        let mut map = write(&self.inner)?;
        if map.contains_key(&order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }
        map.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(read(&self.inner)?.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let all = read(&self.inner)?.values().cloned().collect();
        Ok(Self::sorted(all))
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mine = read(&self.inner)?
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::sorted(mine))
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected: ExpectedVersion,
    ) -> Result<Order, StoreError> {
        let mut map = write(&self.inner)?;
        let order = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        check_version(expected, order.version)?;
        order.status = status;
        order.version += 1;
        Ok(order.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut map = write(&self.inner)?;
        if map.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(read(&self.inner)?.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let map = read(&self.inner)?;
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(read(&self.inner)?.values().find(|u| u.email == email).cloned())
    }
}

/// Login codes are short-lived and per-process; this is the only OTP store.
#[derive(Debug, Default)]
pub struct InMemoryOtpStore {
    inner: RwLock<HashMap<String, OtpChallenge>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, email: &str, challenge: OtpChallenge) -> Result<(), StoreError> {
        write(&self.inner)?.insert(email.to_string(), challenge);
        Ok(())
    }

    async fn verify_and_consume(
        &self,
        email: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<Result<(), OtpError>, StoreError> {
        let mut guard = write(&self.inner)?;
        let Some(challenge) = guard.get_mut(email) else {
            return Ok(Err(OtpError::NotRequested));
        };

        let outcome = challenge.verify(submitted, now);
        if !matches!(outcome, Err(OtpError::Mismatch)) {
            guard.remove(email);
        }
        Ok(outcome)
    }
}
