use serde::Deserialize;
use serde_json::{Value, json};

use storefront_auth::User;
use storefront_catalog::Product;
use storefront_core::{OrderId, ProductId, UserId};
use storefront_infra::order_workflow::{AdminOrderView, ResolvedLineItem, UserOrderView};
use storefront_orders::{LineItem, Order, PlaceOrder, RequestedItem, ShippingDetails};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// A cart line as sent by the storefront. `name`, `category` and `price`
/// are accepted but ignored; the product record is authoritative.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    #[serde(rename = "_id", alias = "productId")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub selected_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShippingDetailsRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub pincode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub shipping_details: Option<ShippingDetailsRequest>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl PlaceOrderRequest {
    /// Map the wire shape onto the checkout command for `user_id`.
    ///
    /// A malformed product id cannot name a product; it is mapped to an id no
    /// product has, so it surfaces as "not found" after the request checks.
    pub fn into_command(self, user_id: UserId) -> PlaceOrder {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let (product_id, label) = match item.id.trim().parse::<ProductId>() {
                    Ok(id) => (id, item.name),
                    Err(_) => (ProductId::default(), item.name.or(Some(item.id))),
                };
                RequestedItem {
                    product_id,
                    quantity: item.quantity,
                    size: item.selected_size,
                    label,
                }
            })
            .collect();

        PlaceOrder {
            user_id,
            items,
            total_amount: self.total_amount,
            shipping_details: self.shipping_details.map(|s| ShippingDetails {
                name: s.name,
                phone: s.phone,
                address: s.address,
                pincode: s.pincode,
            }),
            payment_method: self.payment_method,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("Product not found"))
}

pub fn parse_order_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("Order not found"))
}

// -------------------------
// Response mapping
// -------------------------

pub fn user_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
        "role": user.role.as_str(),
        "createdAt": user.created_at,
    })
}

pub fn product_json(p: &Product) -> Value {
    json!({
        "_id": p.id.to_string(),
        "name": p.name,
        "category": p.category,
        "price": p.price,
        "description": p.description,
        "image": p.image,
        "stock": p.stock,
        "features": p.features,
        "fullDescription": p.full_description,
        "sizes": p.sizes,
        "colors": p.colors,
        "careInstructions": p.care_instructions,
        "material": p.material,
        "origin": p.origin,
        "createdAt": p.created_at,
    })
}

fn line_json(line: &LineItem) -> Value {
    json!({
        "product": line.product_id.to_string(),
        "name": line.name,
        "category": line.category,
        "quantity": line.quantity,
        "selectedSize": line.size,
        "price": line.price,
    })
}

fn resolved_line_json(line: &ResolvedLineItem) -> Value {
    json!({
        "product": {
            "_id": line.product_id.to_string(),
            "name": line.name,
            "image": line.image,
            "category": line.category,
        },
        "name": line.name,
        "category": line.category,
        "quantity": line.quantity,
        "selectedSize": line.size,
        "price": line.price,
    })
}

fn order_fields(order: &Order, user: Value, items: Vec<Value>) -> Value {
    json!({
        "_id": order.id.to_string(),
        "user": user,
        "items": items,
        "totalAmount": order.total_amount,
        "shippingDetails": {
            "name": order.shipping_details.name,
            "phone": order.shipping_details.phone,
            "address": order.shipping_details.address,
            "pincode": order.shipping_details.pincode,
        },
        "paymentMethod": order.payment_method.as_str(),
        "status": order.status.as_str(),
        "createdAt": order.created_at,
    })
}

pub fn order_json(order: &Order) -> Value {
    order_fields(
        order,
        Value::String(order.user_id.to_string()),
        order.items.iter().map(line_json).collect(),
    )
}

pub fn admin_order_json(view: &AdminOrderView) -> Value {
    let user = match &view.customer {
        Some(c) => json!({
            "_id": view.order.user_id.to_string(),
            "name": c.name,
            "email": c.email,
        }),
        None => Value::Null,
    };
    order_fields(&view.order, user, view.order.items.iter().map(line_json).collect())
}

pub fn user_order_json(view: &UserOrderView) -> Value {
    order_fields(
        &view.order,
        Value::String(view.order.user_id.to_string()),
        view.items.iter().map(resolved_line_json).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> PlaceOrderRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn storefront_cart_shape_maps_to_command() {
        let pid = ProductId::new();
        let req = body(json!({
            "items": [{
                "_id": pid.to_string(),
                "name": "Tee",
                "category": "Tops",
                "quantity": 2,
                "selectedSize": "M",
                "price": "₹499"
            }],
            "totalAmount": 998,
            "shippingDetails": {"name": "Asha", "phone": "9", "address": "MG Road", "pincode": "560001"},
            "paymentMethod": "COD"
        }));

        let user = UserId::new();
        let cmd = req.into_command(user);
        assert_eq!(cmd.user_id, user);
        assert_eq!(cmd.items[0].product_id, pid);
        assert_eq!(cmd.items[0].quantity, 2);
        assert_eq!(cmd.items[0].size.as_deref(), Some("M"));
        assert_eq!(cmd.payment_method.as_deref(), Some("COD"));
        assert_eq!(cmd.total_amount, Some(998.0));
    }

    #[test]
    fn missing_fields_are_left_for_validation() {
        let cmd = body(json!({})).into_command(UserId::new());
        assert!(cmd.items.is_empty());
        assert!(cmd.shipping_details.is_none());
        assert!(cmd.payment_method.is_none());
        assert!(cmd.total_amount.is_none());
    }

    #[test]
    fn malformed_ids_become_unknown_products_named_by_the_client() {
        let cmd = body(json!({"items": [
            {"_id": "nope", "name": "Ghost", "quantity": 1},
            {"_id": "also-bad", "quantity": 2}
        ]}))
        .into_command(UserId::new());

        assert_eq!(cmd.items.len(), 2);
        assert_eq!(cmd.items[0].label.as_deref(), Some("Ghost"));
        assert_eq!(cmd.items[1].label.as_deref(), Some("also-bad"));
        assert_ne!(cmd.items[0].product_id, cmd.items[1].product_id);
    }
}
