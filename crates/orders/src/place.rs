//! Checkout: validating an order request against the catalog.
//!
//! Everything here is decided against one snapshot of the requested
//! products, before any stock is touched. A request that fails for any line
//! fails as a whole.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use storefront_catalog::Product;
use storefront_core::{OrderId, ProductId, UserId};

use crate::{LineItem, Order, OrderError, OrderStatus, PaymentMethod, ShippingDetails};

/// One requested line as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub size: Option<String>,
    /// Client-side display name, used only to name the line in errors.
    pub label: Option<String>,
}

impl RequestedItem {
    fn display_name(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => self.product_id.to_string(),
        }
    }
}

/// Command: place an order.
///
/// Shipping details, payment method and total are optional here so that a
/// missing field is reported as a validation error rather than a decode error.
/// The payment method stays raw until [`validate_request`] has checked it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub items: Vec<RequestedItem>,
    pub total_amount: Option<f64>,
    pub shipping_details: Option<ShippingDetails>,
    pub payment_method: Option<String>,
}

impl PlaceOrder {
    /// Product ids in request order, without repeats.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }
}

/// Shape checks that need no catalog lookup.
pub fn validate_request(req: &PlaceOrder) -> Result<(), OrderError> {
    if req.items.is_empty() {
        return Err(OrderError::validation("No items in order"));
    }

    let shipping = req
        .shipping_details
        .as_ref()
        .ok_or_else(|| OrderError::validation("Shipping details are required"))?;
    shipping.validate()?;

    parse_payment_method(req.payment_method.as_deref())?;

    match req.total_amount {
        None => return Err(OrderError::validation("Total amount is required")),
        Some(t) if !t.is_finite() || t < 0.0 => {
            return Err(OrderError::validation("Total amount must be a non-negative number"));
        }
        Some(_) => {}
    }

    for item in &req.items {
        if item.quantity <= 0 {
            return Err(OrderError::validation(format!(
                "Quantity must be at least 1 for {}",
                item.display_name()
            )));
        }
    }

    Ok(())
}

fn parse_payment_method(raw: Option<&str>) -> Result<PaymentMethod, OrderError> {
    match raw.map(str::trim) {
        None | Some("") => Err(OrderError::validation("Payment method is required")),
        Some(raw) => PaymentMethod::parse(raw)
            .ok_or_else(|| OrderError::validation(format!("Invalid payment method: {raw}"))),
    }
}

/// Validate a request against the catalog snapshot and build the `Pending`
/// order it would create.
///
/// `products` holds whatever the store returned for [`PlaceOrder::product_ids`];
/// absent entries are unknown products. Quantities of repeated lines for the
/// same product are summed before the stock check.
pub fn build_order(
    req: PlaceOrder,
    products: &HashMap<ProductId, Product>,
    order_id: OrderId,
    now: DateTime<Utc>,
) -> Result<Order, OrderError> {
    validate_request(&req)?;

    for item in &req.items {
        if !products.contains_key(&item.product_id) {
            return Err(OrderError::ProductNotFound {
                item: item.display_name(),
            });
        }
    }

    let mut demand: HashMap<ProductId, i64> = HashMap::new();
    for item in &req.items {
        let wanted = demand.entry(item.product_id).or_default();
        *wanted = wanted.checked_add(item.quantity).ok_or_else(|| {
            OrderError::validation(format!("Quantity too large for {}", item.display_name()))
        })?;
    }

    for product_id in req.product_ids() {
        let product = &products[&product_id];
        let wanted = demand[&product_id];
        if !product.has_stock_for(wanted) {
            return Err(OrderError::InsufficientStock {
                item: product.name.clone(),
                available: product.stock,
            });
        }
    }

    let items = req
        .items
        .into_iter()
        .map(|item| {
            let product = &products[&item.product_id];
            LineItem {
                product_id: item.product_id,
                name: product.name.clone(),
                category: product.category.clone(),
                quantity: item.quantity,
                size: item.size.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                price: product.price.clone(),
            }
        })
        .collect();

    let payment_method = parse_payment_method(req.payment_method.as_deref())?;

    // Presence of both was checked by validate_request.
    let (Some(shipping_details), Some(total_amount)) = (req.shipping_details, req.total_amount) else {
        return Err(OrderError::validation("incomplete order request"));
    };

    Ok(Order {
        id: order_id,
        user_id: req.user_id,
        items,
        total_amount,
        shipping_details,
        payment_method,
        status: OrderStatus::PENDING,
        created_at: now,
        version: 1,
    })
}
