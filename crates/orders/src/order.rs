use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{AggregateRoot, OrderId, ProductId, UserId};

use crate::{OrderError, StockMovement, reconcile};

/// Order status.
///
/// Free-form on the wire: admins may set any non-empty label. Only
/// `Cancelled` carries stock semantics; the other constants are the
/// conventional lifecycle values shown in the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(Cow<'static, str>);

impl OrderStatus {
    pub const PENDING: OrderStatus = OrderStatus(Cow::Borrowed("Pending"));
    pub const IN_PROGRESS: OrderStatus = OrderStatus(Cow::Borrowed("In Progress"));
    pub const SHIPPED: OrderStatus = OrderStatus(Cow::Borrowed("Shipped"));
    pub const DELIVERED: OrderStatus = OrderStatus(Cow::Borrowed("Delivered"));
    pub const CANCELLED: OrderStatus = OrderStatus(Cow::Borrowed("Cancelled"));

    /// Parse an admin-supplied status. Surrounding whitespace is dropped;
    /// matching against `Cancelled` is otherwise exact.
    pub fn parse(raw: &str) -> Result<Self, OrderError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OrderError::validation("Status is required"));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_cancelled(&self) -> bool {
        self.as_str() == "Cancelled"
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepted payment methods. Older clients send `COD` and `GPay`;
/// both spellings are still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(alias = "COD")]
    CashOnDelivery,
    Card,
    #[serde(alias = "GPay")]
    UPI,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
            PaymentMethod::Card => "Card",
            PaymentMethod::UPI => "UPI",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "CashOnDelivery" | "COD" => Some(PaymentMethod::CashOnDelivery),
            "Card" => Some(PaymentMethod::Card),
            "UPI" | "GPay" => Some(PaymentMethod::UPI),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
}

impl ShippingDetails {
    pub fn validate(&self) -> Result<(), OrderError> {
        for (field, value) in [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("pincode", &self.pincode),
        ] {
            if value.trim().is_empty() {
                return Err(OrderError::validation(format!("Shipping {field} is required")));
            }
        }
        Ok(())
    }
}

/// Order line: product reference plus the display fields captured at
/// checkout, so the order reads the same after the product is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub size: Option<String>,
    pub price: String,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    pub shipping_details: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Order {
    /// Move to `target` and report which stock movement the change implies.
    ///
    /// Only the in-memory copy changes; persisting the status and applying
    /// the movement are the caller's job.
    pub fn transition(&mut self, target: OrderStatus) -> StockMovement {
        let movement = reconcile(&self.status, &target);
        self.status = target;
        self.version += 1;
        movement
    }

    /// Per-product stock deltas for a movement, with repeated products merged.
    pub fn stock_deltas(&self, movement: StockMovement) -> Vec<(ProductId, i64)> {
        movement.deltas(&self.items)
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
