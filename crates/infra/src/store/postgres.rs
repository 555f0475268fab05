//! Postgres-backed document stores.
//!
//! Line items, shipping details and product lists are kept as JSONB columns
//! so each record still reads back as one document. Stock changes are single
//! `UPDATE` statements: `stock = stock + $n` for unconditional adjustments
//! and `... WHERE stock >= $n` for the conditional decrement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use storefront_auth::{Role, User};
use storefront_catalog::Product;
use storefront_core::{ExpectedVersion, OrderId, ProductId, UserId};
use storefront_orders::{LineItem, Order, OrderStatus, PaymentMethod, ShippingDetails};

use super::{Decrement, OrderStore, ProductStore, StoreError, UserStore};

const SCHEMA: &str = include_str!("schema.sql");

/// One pool, three document collections.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&*self.pool).await?;
        Ok(())
    }
}

fn expected_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(v as i64),
    }
}

fn decode<T>(res: Result<T, sqlx::Error>) -> Result<T, StoreError> {
    res.map_err(|e| StoreError::Backend(format!("failed to decode row: {e}")))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId::from_uuid(decode(row.try_get("id"))?),
        name: decode(row.try_get("name"))?,
        category: decode(row.try_get("category"))?,
        price: decode(row.try_get("price"))?,
        description: decode(row.try_get("description"))?,
        image: decode(row.try_get("image"))?,
        stock: decode(row.try_get("stock"))?,
        features: decode(row.try_get::<Json<Vec<String>>, _>("features"))?.0,
        full_description: decode(row.try_get("full_description"))?,
        sizes: decode(row.try_get::<Json<Vec<String>>, _>("sizes"))?.0,
        colors: decode(row.try_get::<Json<Vec<String>>, _>("colors"))?.0,
        care_instructions: decode(row.try_get("care_instructions"))?,
        material: decode(row.try_get("material"))?,
        origin: decode(row.try_get("origin"))?,
        created_at: decode(row.try_get::<DateTime<Utc>, _>("created_at"))?,
        version: decode(row.try_get::<i64, _>("version"))? as u64,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let payment: String = decode(row.try_get("payment_method"))?;
    let status: String = decode(row.try_get("status"))?;

    Ok(Order {
        id: OrderId::from_uuid(decode(row.try_get("id"))?),
        user_id: UserId::from_uuid(decode(row.try_get("user_id"))?),
        items: decode(row.try_get::<Json<Vec<LineItem>>, _>("items"))?.0,
        total_amount: decode(row.try_get("total_amount"))?,
        shipping_details: decode(row.try_get::<Json<ShippingDetails>, _>("shipping_details"))?.0,
        payment_method: PaymentMethod::parse(&payment)
            .ok_or_else(|| StoreError::Backend(format!("unknown payment method '{payment}'")))?,
        status: OrderStatus::parse(&status).map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: decode(row.try_get::<DateTime<Utc>, _>("created_at"))?,
        version: decode(row.try_get::<i64, _>("version"))? as u64,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    Ok(User {
        id: UserId::from_uuid(decode(row.try_get("id"))?),
        name: decode(row.try_get("name"))?,
        email: decode(row.try_get("email"))?,
        role: Role::new(decode(row.try_get::<String, _>("role"))?),
        created_at: decode(row.try_get::<DateTime<Utc>, _>("created_at"))?,
    })
}

impl PostgresStore {
    async fn current_version(&self, table: &'static str, id: Uuid) -> Result<Option<u64>, StoreError> {
        let sql = format!("SELECT version FROM {table} WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&*self.pool).await?;
        row.map(|r| decode(r.try_get::<i64, _>("version")).map(|v| v as u64))
            .transpose()
    }

    async fn missing_or_conflict(
        &self,
        table: &'static str,
        id: Uuid,
        expected: ExpectedVersion,
    ) -> StoreError {
        match self.current_version(table, id).await {
            Ok(Some(actual)) => StoreError::VersionConflict { expected, actual },
            Ok(None) => StoreError::NotFound,
            Err(e) => e,
        }
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price, description, image, stock,
                features, full_description, sizes, colors,
                care_instructions, material, origin, created_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.price)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.stock)
        .bind(Json(&product.features))
        .bind(&product.full_description)
        .bind(Json(&product.sizes))
        .bind(Json(&product.colors))
        .bind(&product.care_instructions)
        .bind(&product.material)
        .bind(&product.origin)
        .bind(product.created_at)
        .bind(product.version as i64)
        .execute(&*self.pool)
        .await?;
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY created_at DESC, id DESC")
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn replace(&self, product: Product, expected: ExpectedVersion) -> Result<Product, StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE products SET
                name = $2, category = $3, price = $4, description = $5, image = $6,
                stock = $7, features = $8, full_description = $9, sizes = $10,
                colors = $11, care_instructions = $12, material = $13, origin = $14,
                version = $15
            WHERE id = $1 AND ($16::BIGINT IS NULL OR version = $16)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.price)
        .bind(&product.description)
        .bind(&product.image)
        .bind(product.stock)
        .bind(Json(&product.features))
        .bind(&product.full_description)
        .bind(Json(&product.sizes))
        .bind(Json(&product.colors))
        .bind(&product.care_instructions)
        .bind(&product.material)
        .bind(&product.origin)
        .bind(product.version as i64)
        .bind(expected_param(expected))
        .execute(&*self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(self
                .missing_or_conflict("products", *product.id.as_uuid(), expected)
                .await);
        }
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(
            "UPDATE products SET stock = stock + $2, version = version + 1 WHERE id = $1 RETURNING stock",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .fetch_optional(&*self.pool)
        .await?;
        row.map(|r| decode(r.try_get::<i64, _>("stock"))).transpose()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn try_decrement_stock(&self, id: ProductId, quantity: i64) -> Result<Decrement, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE products SET stock = stock - $2, version = version + 1
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_uuid())
        .bind(quantity)
        .fetch_optional(&*self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(Decrement::Applied(decode(row.try_get::<i64, _>("stock"))?));
        }

        let seen = sqlx::query("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        match seen {
            Some(row) => Ok(Decrement::Insufficient(decode(row.try_get::<i64, _>("stock"))?)),
            None => Ok(Decrement::Missing),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(order_id = %order.id), err)]
    async fn insert(&self, order: Order) -> Result<Order, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, items, total_amount, shipping_details,
                payment_method, status, created_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(Json(&order.shipping_details))
        .bind(order.payment_method.as_str())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.version as i64)
        .execute(&*self.pool)
        .await?;
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        expected: ExpectedVersion,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE orders SET status = $2, version = version + 1
            WHERE id = $1 AND ($3::BIGINT IS NULL OR version = $3)
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(expected_param(expected))
        .fetch_optional(&*self.pool)
        .await?;

        match row {
            Some(row) => order_from_row(&row),
            None => Err(self.missing_or_conflict("orders", *id.as_uuid(), expected).await),
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        sqlx::query("INSERT INTO users (id, name, email, role, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .execute(&*self.pool)
            .await?;
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_do_not_require_a_user_row() {
        let orders = SCHEMA
            .split("CREATE TABLE IF NOT EXISTS orders")
            .nth(1)
            .unwrap();
        assert!(orders.contains("user_id"));
        assert!(!SCHEMA.contains("REFERENCES"));
    }
}
