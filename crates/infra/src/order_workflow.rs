//! Order placement and status workflow.
//!
//! Orchestrates the pure rules in `storefront-orders` against the product,
//! order and user stores:
//!
//! ```text
//! place_order                          update_status
//!   validate request                     admin gate
//!   load products (one snapshot)         load order
//!   build Pending order                  parse target status
//!   [atomic] reserve stock per line      [atomic] CAS status write
//!   insert order                         apply Restore / Deduct deltas
//!   [baseline] decrement stock           [baseline] unconditional write
//! ```
//!
//! In [`StockMode::Baseline`] the check and the decrement are separate store
//! calls, as are the status read and write. [`StockMode::Atomic`] closes
//! both windows.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use storefront_auth::{Principal, require_admin, require_owner_or_admin};
use storefront_catalog::Product;
use storefront_core::{ExpectedVersion, OrderId, ProductId, UserId};
use storefront_orders::{
    LineItem, Order, OrderError, OrderStatus, PlaceOrder, StockMovement, build_order, reconcile,
    validate_request,
};

use crate::config::StockMode;
use crate::error::ServiceError;
use crate::store::{Decrement, OrderStore, ProductStore, StoreError, UserStore};

/// Owning user's contact, as shown in the admin order list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminOrderView {
    pub order: Order,
    /// `None` if the account no longer exists.
    pub customer: Option<Customer>,
}

/// A line item with display fields taken from the current product record,
/// or from the checkout snapshot when the product is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub quantity: i64,
    pub size: Option<String>,
    pub price: String,
}

impl ResolvedLineItem {
    fn resolve(line: &LineItem, product: Option<&Product>) -> Self {
        match product {
            Some(p) => Self {
                product_id: line.product_id,
                name: p.name.clone(),
                category: p.category.clone(),
                image: Some(p.image.clone()),
                quantity: line.quantity,
                size: line.size.clone(),
                price: line.price.clone(),
            },
            None => Self {
                product_id: line.product_id,
                name: line.name.clone(),
                category: line.category.clone(),
                image: None,
                quantity: line.quantity,
                size: line.size.clone(),
                price: line.price.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserOrderView {
    pub order: Order,
    pub items: Vec<ResolvedLineItem>,
}

pub struct OrderWorkflow {
    products: Arc<dyn ProductStore>,
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserStore>,
    mode: StockMode,
}

impl OrderWorkflow {
    pub fn new(
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
        mode: StockMode,
    ) -> Self {
        Self {
            products,
            orders,
            users,
            mode,
        }
    }

    /// Validate, persist a `Pending` order and take its quantities from stock.
    ///
    /// All validation runs before any mutation: a rejected request leaves
    /// every product's stock as it was.
    pub async fn place_order(&self, req: PlaceOrder) -> Result<Order, ServiceError> {
        validate_request(&req)?;

        let ids = req.product_ids();
        let catalog: HashMap<ProductId, Product> = self
            .products
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let order = build_order(req, &catalog, OrderId::new(), Utc::now())?;

        let order = match self.mode {
            StockMode::Baseline => {
                let order = self.orders.insert(order).await?;
                for (product_id, delta) in order.stock_deltas(StockMovement::Deduct) {
                    self.adjust(product_id, delta, order.id).await?;
                }
                order
            }
            StockMode::Atomic => {
                let reserved = self.reserve(&order).await?;
                match self.orders.insert(order).await {
                    Ok(order) => order,
                    Err(e) => {
                        self.release(&reserved).await;
                        return Err(e.into());
                    }
                }
            }
        };

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            lines = order.items.len(),
            total_amount = order.total_amount,
            mode = %self.mode,
            "order placed"
        );
        Ok(order)
    }

    /// Admin-only status change, reconciling stock across the `Cancelled`
    /// boundary.
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        raw_status: &str,
    ) -> Result<Order, ServiceError> {
        require_admin(principal)?;

        let current = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        let target = OrderStatus::parse(raw_status)?;

        let (updated, movement) = match self.mode {
            StockMode::Baseline => {
                let mut next = current.clone();
                let movement = next.transition(target.clone());
                for (product_id, delta) in current.stock_deltas(movement) {
                    self.adjust(product_id, delta, order_id).await?;
                }
                let updated = self
                    .orders
                    .update_status(order_id, target, ExpectedVersion::Any)
                    .await
                    .map_err(status_write_error)?;
                (updated, movement)
            }
            StockMode::Atomic => {
                let updated = self
                    .orders
                    .update_status(order_id, target, ExpectedVersion::Exact(current.version))
                    .await
                    .map_err(status_write_error)?;
                let movement = reconcile(&current.status, &updated.status);
                for (product_id, delta) in current.stock_deltas(movement) {
                    self.adjust(product_id, delta, order_id).await?;
                }
                (updated, movement)
            }
        };

        info!(
            order_id = %order_id,
            from = %current.status,
            to = %updated.status,
            movement = ?movement,
            "order status changed"
        );
        Ok(updated)
    }

    /// Every order, newest first, with the owner's name and email.
    pub async fn list_all(&self, principal: &Principal) -> Result<Vec<AdminOrderView>, ServiceError> {
        require_admin(principal)?;

        let orders = self.orders.list_all().await?;

        let mut seen = HashSet::new();
        let user_ids: Vec<UserId> = orders
            .iter()
            .map(|o| o.user_id)
            .filter(|id| seen.insert(*id))
            .collect();
        let customers: HashMap<UserId, Customer> = self
            .users
            .get_many(&user_ids)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    Customer {
                        name: u.name,
                        email: u.email,
                    },
                )
            })
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.user_id).cloned();
                AdminOrderView { order, customer }
            })
            .collect())
    }

    /// The caller's own orders, newest first, with current product details.
    pub async fn list_for_user(&self, principal: &Principal) -> Result<Vec<UserOrderView>, ServiceError> {
        let orders = self.orders.list_for_user(principal.user_id).await?;

        let mut seen = HashSet::new();
        let product_ids: Vec<ProductId> = orders
            .iter()
            .flat_map(|o| o.items.iter().map(|i| i.product_id))
            .filter(|id| seen.insert(*id))
            .collect();
        let products: HashMap<ProductId, Product> = self
            .products
            .get_many(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = order
                    .items
                    .iter()
                    .map(|line| ResolvedLineItem::resolve(line, products.get(&line.product_id)))
                    .collect();
                UserOrderView { order, items }
            })
            .collect())
    }

    /// One order, readable by its owner or an admin.
    pub async fn get_order(&self, principal: &Principal, order_id: OrderId) -> Result<Order, ServiceError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        require_owner_or_admin(principal, order.user_id)?;
        Ok(order)
    }

    /// Unconditional `stock += delta`; a vanished product is skipped.
    async fn adjust(&self, product_id: ProductId, delta: i64, order_id: OrderId) -> Result<(), ServiceError> {
        match self.products.adjust_stock(product_id, delta).await? {
            Some(stock) => {
                debug!(%product_id, delta, stock, "stock adjusted");
            }
            None => {
                warn!(%product_id, %order_id, delta, "product missing; stock adjustment skipped");
            }
        }
        Ok(())
    }

    /// Take each line's quantity with a conditional decrement. On the first
    /// failure every earlier reservation is given back.
    async fn reserve(&self, order: &Order) -> Result<Vec<(ProductId, i64)>, ServiceError> {
        let mut reserved: Vec<(ProductId, i64)> = Vec::new();

        for (product_id, delta) in order.stock_deltas(StockMovement::Deduct) {
            let quantity = -delta;
            let outcome = match self.products.try_decrement_stock(product_id, quantity).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.release(&reserved).await;
                    return Err(e.into());
                }
            };

            match outcome {
                Decrement::Applied(_) => reserved.push((product_id, quantity)),
                Decrement::Insufficient(available) => {
                    self.release(&reserved).await;
                    return Err(OrderError::InsufficientStock {
                        item: line_name(order, product_id),
                        available,
                    }
                    .into());
                }
                Decrement::Missing => {
                    self.release(&reserved).await;
                    return Err(OrderError::ProductNotFound {
                        item: line_name(order, product_id),
                    }
                    .into());
                }
            }
        }

        Ok(reserved)
    }

    async fn release(&self, reserved: &[(ProductId, i64)]) {
        for (product_id, quantity) in reserved {
            if let Err(e) = self.products.adjust_stock(*product_id, *quantity).await {
                error!(%product_id, quantity, error = %e, "failed to release stock reservation");
            }
        }
    }
}

fn line_name(order: &Order, product_id: ProductId) -> String {
    order
        .items
        .iter()
        .find(|i| i.product_id == product_id)
        .map(|i| i.name.clone())
        .unwrap_or_else(|| product_id.to_string())
}

fn status_write_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::NotFound => OrderError::OrderNotFound.into(),
        StoreError::VersionConflict { .. } => OrderError::Conflict.into(),
        other => other.into(),
    }
}
